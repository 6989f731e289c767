use super::{Connection, ConnectionExt, Message};
use crate::{matrix::EventQueue, Duration, Instant};

/// Secondary-half side of the split link: forwards locally debounced events.
pub struct SplitTransmitter<C: Connection> {
    connection: C,
    heartbeat_interval: Duration,
    last_sent: Option<Instant>,
}

impl<C: Connection> SplitTransmitter<C> {
    pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::millis(100);

    pub fn new(connection: C, heartbeat_interval: Duration) -> Self {
        SplitTransmitter {
            connection,
            heartbeat_interval,
            last_sent: None,
        }
    }

    /// Sends every queued event in order, or a heartbeat when the link has been quiet
    /// for a whole interval.
    pub fn forward(&mut self, now: Instant, queue: &mut EventQueue) {
        while let Some(event) = queue.pop_front() {
            let (row, col) = (event.coordinate.row, event.coordinate.col);
            let message = if event.pressed {
                Message::Press { row, col }
            } else {
                Message::Release { row, col }
            };
            self.connection.send_message(message);
            self.last_sent = Some(now);
        }
        let quiet = self
            .last_sent
            .map_or(true, |sent| now >= sent + self.heartbeat_interval);
        if quiet {
            self.connection.send_message(Message::Heartbeat);
            self.last_sent = Some(now);
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }
}
