use heapless::Deque;

use super::{
    Effects, ExternalCommunicator, KeyboardReport, KeyboardState, Keymap, ReportBuilder,
    Resolver,
};
use crate::{
    config::Config,
    matrix::{EventQueue, EventSource},
    Error, Instant,
};

/// Reports kept between `tick` and `send_reports`.
pub const OUTBOX_LEN: usize = 16;

/// Owns every stage between the switches and the host.
///
/// Call [`Controller::tick`] once per scan interval and [`Controller::send_reports`]
/// whenever the transport can take reports.
pub struct Controller<
    const ROWS: usize,
    const COLS: usize,
    const LAYERS: usize,
    P: EventSource,
    S: EventSource,
    C: ExternalCommunicator,
> {
    pub communicator: C,
    pub primary: P,
    pub secondary: S,
    resolver: Resolver<ROWS, COLS, LAYERS>,
    report_builder: ReportBuilder,
    events: EventQueue,
    outbox: Deque<KeyboardReport, OUTBOX_LEN>,
}

impl<
        const ROWS: usize,
        const COLS: usize,
        const LAYERS: usize,
        P: EventSource,
        S: EventSource,
        C: ExternalCommunicator,
    > Controller<ROWS, COLS, LAYERS, P, S, C>
{
    pub fn new(
        config: &Config,
        keymap: Keymap<ROWS, COLS, LAYERS>,
        primary: P,
        secondary: S,
        communicator: C,
    ) -> Result<Self, Error> {
        config.validate::<ROWS, COLS>()?;
        keymap.check_behaviors(config.behaviors)?;
        primary.validate::<ROWS, COLS>()?;
        secondary.validate::<ROWS, COLS>()?;
        let resolver = Resolver::new(keymap, config.hold_tap)?;
        info!("Keyboard ready with {} layers", LAYERS);
        Ok(Controller {
            communicator,
            primary,
            secondary,
            resolver,
            report_builder: ReportBuilder::new(),
            events: EventQueue::new(),
            outbox: Deque::new(),
        })
    }

    pub fn get_state(&self) -> KeyboardState {
        KeyboardState {
            layer: self.resolver.layers().top(),
            report: self.report_builder.report(),
            overflow_count: self.report_builder.overflow_count(),
            pending: self.resolver.pending().is_some(),
        }
    }

    pub fn resolver(&self) -> &Resolver<ROWS, COLS, LAYERS> {
        &self.resolver
    }

    pub fn tick(&mut self, now: Instant) {
        self.primary.poll(now, &mut self.events);
        self.secondary.poll(now, &mut self.events);

        while let Some(event) = self.events.pop_front() {
            trace!("{}", event);
            // expire hold-taps at the event time so a late interrupt sees the hold
            let mut effects = Effects::new();
            self.resolver.poll(event.time, &mut effects);
            self.apply(&effects);
            effects.clear();
            self.resolver.handle(event, &mut effects);
            self.apply(&effects);
        }

        let mut effects = Effects::new();
        self.resolver.poll(now, &mut effects);
        self.apply(&effects);
    }

    /// Sends queued reports in order. On a transport error the failed report stays queued.
    /// Reports queued while the host is not listening are discarded.
    pub fn send_reports(&mut self) -> Result<(), C::Error> {
        if !self.communicator.is_ready() {
            self.outbox.clear();
            return Ok(());
        }
        while let Some(report) = self.outbox.front() {
            self.communicator.send_report(report)?;
            self.outbox.pop_front();
        }
        Ok(())
    }

    /// Forgets held keys, layers and queued reports.
    pub fn reset(&mut self) {
        self.resolver.reset();
        self.report_builder.reset();
        self.events.clear();
        self.outbox.clear();
    }

    fn apply(&mut self, effects: &Effects) {
        for &effect in effects {
            let Some(report) = self.report_builder.apply(effect) else {
                continue;
            };
            debug!("{}", report);
            if self.outbox.is_full() {
                warn!("Outbox full, dropping the oldest report");
                self.outbox.pop_front();
            }
            self.outbox.push_back(report).ok();
        }
    }
}
