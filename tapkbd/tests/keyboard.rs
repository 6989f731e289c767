use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
};

use tapkbd::{
    config::{Behaviors, Config, SplitConfig},
    keyboard::{Controller, ExternalCommunicator, KeyAction, KeyboardReport, Keymap},
    layout,
    matrix::{EventQueue, EventSource, Half, KeySwitches, RawMatrix, Scanner},
    split::{
        Connection, LinkFrame, LinkState, Queue, SplitLink, SplitReceiver, SplitTransmitter,
        Unsplit,
    },
    Error, Instant,
};

const BASE: [[KeyAction; 3]; 1] = layout! { r#"| A | HT(F,LSft) | MO(1) |"# };
const NUMBERS: [[KeyAction; 3]; 1] = layout! { r#"| 1 | Trn | "" |"# };
const WIDE: [[KeyAction; 8]; 1] = layout! { "| A | B | C | D | E | F | G | H |" };
const SPLIT: [[KeyAction; 4]; 1] = layout! { "| A | B | C | D |" };

#[derive(Clone)]
struct Switches<const ROWS: usize, const COLS: usize>(Rc<RefCell<RawMatrix<ROWS, COLS>>>);

impl<const ROWS: usize, const COLS: usize> Switches<ROWS, COLS> {
    fn new() -> Self {
        Switches(Rc::new(RefCell::new([[false; COLS]; ROWS])))
    }

    fn set(&self, row: usize, col: usize, closed: bool) {
        self.0.borrow_mut()[row][col] = closed;
    }
}

impl<const ROWS: usize, const COLS: usize> KeySwitches<ROWS, COLS> for Switches<ROWS, COLS> {
    type Error = Infallible;

    fn scan(&mut self, state: &mut RawMatrix<ROWS, COLS>) -> Result<(), Infallible> {
        *state = *self.0.borrow();
        Ok(())
    }
}

#[derive(Default)]
struct Host {
    reports: RefCell<Vec<KeyboardReport>>,
}

impl Host {
    fn count(&self) -> usize {
        self.reports.borrow().len()
    }

    fn last(&self) -> KeyboardReport {
        self.reports.borrow().last().copied().unwrap_or_default()
    }
}

impl ExternalCommunicator for &Host {
    type Error = Infallible;

    fn is_ready(&self) -> bool {
        true
    }

    fn send_report(&self, report: &KeyboardReport) -> Result<(), Infallible> {
        self.reports.borrow_mut().push(*report);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Wire {
    bytes: Rc<RefCell<VecDeque<u8>>>,
    cut: Rc<Cell<bool>>,
}

impl Connection for Wire {
    type Error = &'static str;

    fn read_raw(&self, buffer: &mut [u8]) -> nb::Result<usize, &'static str> {
        if self.cut.get() {
            return Err(nb::Error::Other("cut"));
        }
        let mut bytes = self.bytes.borrow_mut();
        let len = buffer.len().min(bytes.len());
        if len == 0 {
            return Err(nb::Error::WouldBlock);
        }
        for (slot, byte) in buffer.iter_mut().zip(bytes.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }

    fn write(&self, data: &[u8]) {
        self.bytes.borrow_mut().extend(data);
    }
}

fn ms(ms: u64) -> Instant {
    Instant::from_ticks(ms)
}

fn run<const R: usize, const C: usize, const L: usize, P: EventSource, S: EventSource>(
    controller: &mut Controller<R, C, L, P, S, &Host>,
    ticks: std::ops::RangeInclusive<u64>,
) {
    for t in ticks {
        controller.tick(ms(t));
        controller.send_reports().unwrap();
    }
}

fn one_piece(host: &Host) -> (Switches<1, 3>, Controller<1, 3, 2, Scanner<Switches<1, 3>, 1, 3>, Unsplit, &Host>) {
    let config = Config::default();
    let switches = Switches::new();
    let scanner = Scanner::new(switches.clone(), config.debounce_ticks, Half::Primary, 0);
    let keymap = Keymap::new([BASE, NUMBERS]).unwrap();
    let controller = Controller::new(&config, keymap, scanner, Unsplit, host).unwrap();
    (switches, controller)
}

#[test]
fn debounced_press_reaches_the_host() {
    let host = Host::default();
    let (switches, mut controller) = one_piece(&host);

    switches.set(0, 0, true);
    run(&mut controller, 1..=4);
    assert_eq!(host.count(), 0);
    run(&mut controller, 5..=5);
    assert_eq!(host.last().key_codes, [0x04, 0, 0, 0, 0, 0]);

    // chatter shorter than the debounce window never turns into events
    for t in 6..=40 {
        switches.set(0, 2, t % 2 == 0);
        run(&mut controller, t..=t);
    }
    switches.set(0, 2, false);
    assert_eq!(host.count(), 1);

    switches.set(0, 0, false);
    run(&mut controller, 41..=45);
    assert_eq!(host.count(), 2);
    assert!(host.last().is_empty());
}

#[test]
fn hold_tap_through_the_whole_pipeline() {
    let host = Host::default();
    let (switches, mut controller) = one_piece(&host);

    // tapped: pressed at 1, debounced at 5, released at 51, debounced at 55
    switches.set(0, 1, true);
    run(&mut controller, 1..=50);
    assert_eq!(host.count(), 0);
    assert!(controller.get_state().pending);
    switches.set(0, 1, false);
    run(&mut controller, 51..=60);
    {
        let reports = host.reports.borrow();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].key_codes[0], 0x09);
        assert!(reports[1].is_empty());
    }

    // held: debounced at 105, hold decided 300ms later
    switches.set(0, 1, true);
    run(&mut controller, 101..=404);
    assert_eq!(host.count(), 2);
    run(&mut controller, 405..=405);
    assert_eq!(host.last().modifier, 0b0000_0010);
    switches.set(0, 1, false);
    run(&mut controller, 406..=410);
    assert!(host.last().is_empty());
}

#[test]
fn momentary_layer_falls_through_transparent_keys() {
    let host = Host::default();
    let (switches, mut controller) = one_piece(&host);

    switches.set(0, 2, true);
    run(&mut controller, 1..=5);
    assert_eq!(controller.get_state().layer, 1);
    switches.set(0, 0, true);
    run(&mut controller, 6..=10);
    assert_eq!(host.last().key_codes[0], 0x1e);

    // the layer goes away first, the key still releases what it pressed
    switches.set(0, 2, false);
    run(&mut controller, 11..=15);
    assert_eq!(controller.get_state().layer, 0);
    switches.set(0, 0, false);
    run(&mut controller, 16..=20);
    assert!(host.last().is_empty());
    assert_eq!(host.count(), 2);
}

#[test]
fn newest_key_is_rejected_when_the_report_is_full() {
    let host = Host::default();
    let config = Config::default();
    let switches = Switches::<1, 8>::new();
    let scanner = Scanner::new(switches.clone(), config.debounce_ticks, Half::Primary, 0);
    let keymap = Keymap::new([WIDE]).unwrap();
    let mut controller = Controller::new(&config, keymap, scanner, Unsplit, &host).unwrap();

    for col in 0..8 {
        switches.set(0, col, true);
    }
    run(&mut controller, 1..=5);
    let state = controller.get_state();
    assert_eq!(state.report.key_codes, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    assert_eq!(state.overflow_count, 2);
}

#[test]
fn sources_that_do_not_fit_the_keymap_are_rejected() {
    let host = Host::default();
    let config = Config::default();
    let keymap = || Keymap::new([BASE, NUMBERS]).unwrap();

    let scanner = Scanner::new(Switches::<1, 3>::new(), 0, Half::Primary, 0);
    let rejected = Controller::new(&config, keymap(), scanner, Unsplit, &host).err();
    assert_eq!(rejected, Some(Error::ZeroDebounce));

    let scanner = Scanner::new(Switches::<1, 3>::new(), config.debounce_ticks, Half::Primary, 254);
    let rejected = Controller::new(&config, keymap(), scanner, Unsplit, &host).err();
    assert_eq!(
        rejected,
        Some(Error::HalfOutOfRange {
            half: Half::Primary,
            start: 254,
            end: 257,
            columns: 3,
        })
    );
}

/// The secondary half: its own scanner feeding a transmitter.
struct SecondaryHalf {
    scanner: Scanner<Switches<1, 2>, 1, 2>,
    transmitter: SplitTransmitter<Wire>,
    queue: EventQueue,
}

impl SecondaryHalf {
    fn tick(&mut self, now: Instant) {
        self.scanner.poll(now, &mut self.queue);
        self.transmitter.forward(now, &mut self.queue);
    }
}

type SplitBoard<'a> =
    Controller<1, 4, 1, Scanner<Switches<1, 2>, 1, 2>, SplitLink<'a, 8>, &'a Host>;

fn step(
    now: u64,
    secondary: Option<&mut SecondaryHalf>,
    receiver: &mut SplitReceiver<'_, Wire, 8>,
    controller: &mut SplitBoard<'_>,
) {
    if let Some(secondary) = secondary {
        secondary.tick(ms(now));
    }
    receiver.poll();
    controller.tick(ms(now));
    controller.send_reports().unwrap();
}

#[test]
fn split_halves_merge_and_recover_from_link_loss() {
    let host = Host::default();
    let split = SplitConfig::new(2);
    let config = Config {
        behaviors: Behaviors::all(),
        split: Some(split),
        ..Config::default()
    };
    let wire = Wire::default();
    let mut frames: Queue<LinkFrame, 8> = Queue::new();
    let (producer, consumer) = frames.split();
    let mut receiver = SplitReceiver::new(wire.clone(), producer);

    let left = Switches::<1, 2>::new();
    let right = Switches::<1, 2>::new();
    let primary = Scanner::from_config(left.clone(), &config, Half::Primary);
    let link = SplitLink::new(consumer, split);
    let keymap = Keymap::new([SPLIT]).unwrap();
    let mut controller = Controller::new(&config, keymap, primary, link, &host).unwrap();
    let mut secondary = SecondaryHalf {
        scanner: Scanner::from_config(right.clone(), &config, Half::Secondary),
        transmitter: SplitTransmitter::new(
            wire.clone(),
            SplitTransmitter::<Wire>::DEFAULT_HEARTBEAT_INTERVAL,
        ),
        queue: EventQueue::new(),
    };

    assert_eq!(controller.secondary.state(), LinkState::Waiting);
    right.set(0, 1, true);
    left.set(0, 0, true);
    for t in 1..=5 {
        step(t, Some(&mut secondary), &mut receiver, &mut controller);
    }
    assert_eq!(controller.secondary.state(), LinkState::Connected);
    assert_eq!(host.last().key_codes, [0x04, 0x07, 0, 0, 0, 0]);

    right.set(0, 0, true);
    for t in 6..=10 {
        step(t, Some(&mut secondary), &mut receiver, &mut controller);
    }
    assert_eq!(host.last().key_codes, [0x04, 0x07, 0x06, 0, 0, 0]);

    // transport failure releases everything the secondary half held
    wire.cut.set(true);
    step(11, Some(&mut secondary), &mut receiver, &mut controller);
    assert_eq!(controller.secondary.state(), LinkState::Disconnected);
    assert_eq!(host.last().key_codes, [0x04, 0, 0, 0, 0, 0]);

    // any frame reconnects; a release of a forgotten switch is ignored
    wire.cut.set(false);
    right.set(0, 1, false);
    let before = host.count();
    for t in 12..=16 {
        step(t, Some(&mut secondary), &mut receiver, &mut controller);
    }
    assert_eq!(controller.secondary.state(), LinkState::Connected);
    assert_eq!(host.count(), before);

    right.set(0, 1, true);
    for t in 17..=21 {
        step(t, Some(&mut secondary), &mut receiver, &mut controller);
    }
    assert_eq!(host.last().key_codes, [0x04, 0x07, 0, 0, 0, 0]);

    // the secondary half goes silent
    for t in 22..=520 {
        step(t, None, &mut receiver, &mut controller);
    }
    assert_eq!(controller.secondary.state(), LinkState::Connected);
    step(521, None, &mut receiver, &mut controller);
    assert_eq!(controller.secondary.state(), LinkState::Disconnected);
    assert_eq!(host.last().key_codes, [0x04, 0, 0, 0, 0, 0]);
    assert_eq!(receiver.dropped(), 0);
}
