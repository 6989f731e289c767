use heapless::{spsc::Consumer, Vec};

use super::{LinkFrame, Message};
use crate::{
    config::SplitConfig,
    matrix::{EventQueue, EventSource, Half, RawEvent},
    Error, Instant,
};

/// Secondary switches tracked as pressed at once.
const MAX_PRESSED: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Nothing received yet.
    Waiting,
    Connected,
    /// The link timed out or failed. Any frame reconnects it.
    Disconnected,
}

/// Scan-loop side of the split link: turns received frames into events of the
/// secondary half, in the order they were received.
pub struct SplitLink<'a, const N: usize> {
    consumer: Consumer<'a, LinkFrame, N>,
    config: SplitConfig,
    state: LinkState,
    last_seen: Option<Instant>,
    pressed: Vec<(u8, u8), MAX_PRESSED>,
}

impl<'a, const N: usize> SplitLink<'a, N> {
    pub fn new(consumer: Consumer<'a, LinkFrame, N>, config: SplitConfig) -> Self {
        SplitLink {
            consumer,
            config,
            state: LinkState::Waiting,
            last_seen: None,
            pressed: Vec::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Forgets every pressed secondary switch without emitting releases.
    pub fn reset(&mut self) {
        while self.consumer.dequeue().is_some() {}
        self.state = LinkState::Waiting;
        self.last_seen = None;
        self.pressed.clear();
    }

    fn receive(&mut self, message: Message, now: Instant, queue: &mut EventQueue) {
        self.last_seen = Some(now);
        if self.state != LinkState::Connected {
            info!("Secondary half connected");
            self.state = LinkState::Connected;
        }

        let (row, col, pressed) = match message {
            Message::Press { row, col } => (row, col, true),
            Message::Release { row, col } => (row, col, false),
            Message::Heartbeat => return,
        };
        let Some(coordinate) = self.config.translate(Half::Secondary, row, col) else {
            warn!("Secondary half sent unknown column {}", col);
            return;
        };
        let position = self.pressed.iter().position(|&switch| switch == (row, col));
        match (pressed, position) {
            (true, None) => {
                if self.pressed.push((row, col)).is_err() {
                    warn!("Too many secondary switches pressed, ignoring {}", coordinate);
                    return;
                }
            }
            (false, Some(index)) => {
                self.pressed.swap_remove(index);
            }
            (true, Some(_)) | (false, None) => {
                debug!("Ignoring repeated transition of {}", coordinate);
                return;
            }
        }
        push(queue, RawEvent {
            coordinate,
            pressed,
            time: now,
        });
    }

    fn disconnect(&mut self, now: Instant, queue: &mut EventQueue) {
        if self.state != LinkState::Disconnected {
            warn!(
                "Secondary half disconnected, releasing {} switches",
                self.pressed.len()
            );
        }
        self.state = LinkState::Disconnected;
        self.last_seen = None;
        for &(row, col) in self.pressed.iter() {
            if let Some(coordinate) = self.config.translate(Half::Secondary, row, col) {
                push(queue, RawEvent::release(coordinate, now));
            }
        }
        self.pressed.clear();
    }
}

impl<'a, const N: usize> EventSource for SplitLink<'a, N> {
    fn poll(&mut self, now: Instant, queue: &mut EventQueue) {
        while let Some(frame) = self.consumer.dequeue() {
            match frame {
                LinkFrame::Message(message) => self.receive(message, now, queue),
                LinkFrame::Lost => self.disconnect(now, queue),
            }
        }
        let timed_out = self
            .last_seen
            .is_some_and(|seen| now >= seen + self.config.link_timeout);
        if self.state == LinkState::Connected && timed_out {
            self.disconnect(now, queue);
        }
    }

    fn validate<const ROWS: usize, const COLS: usize>(&self) -> Result<(), Error> {
        self.config.validate::<COLS>()
    }
}

fn push(queue: &mut EventQueue, event: RawEvent) {
    if queue.push_back(event).is_err() {
        error!("Event queue is full, dropping {}", event);
    }
}

/// Event source for keyboards without a second half.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsplit;

impl EventSource for Unsplit {
    fn poll(&mut self, _now: Instant, _queue: &mut EventQueue) {}
}
