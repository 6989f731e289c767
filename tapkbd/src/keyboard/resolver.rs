use heapless::{FnvIndexMap, Vec};
use snafu::ensure;

use super::{Key, KeyAction, Keymap, LayerId, LayerStack, MacroStep};
use crate::{
    config::{HoldTapConfig, InterruptPolicy},
    error::MatrixTooLargeSnafu,
    matrix::{MatrixCoordinate, RawEvent, EVENT_QUEUE_LEN},
    Duration, Error, Instant,
};

/// Upper bound of effects produced by one `handle` or `poll` call.
pub const MAX_EFFECTS: usize = 16;
/// Most effects a single `handle` adds: an interrupted hold-tap plus a modified key.
const HANDLE_RESERVE: usize = 3;
/// Room for every switch of the largest grid, on either half.
const MAX_HELD: usize = 2 * EVENT_QUEUE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEffect {
    KeyDown(Key),
    KeyUp(Key),
}

pub type Effects = Vec<KeyEffect, MAX_EFFECTS>;

/// The effect a pressed switch committed to, undone on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Held {
    Key(Key),
    Modified(Key, Key),
    Layer(LayerId),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    HoldTap { tap: Key, hold: Key },
    LayerTap { layer: LayerId, fallback: Key },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingKey {
    coordinate: MatrixCoordinate,
    kind: PendingKind,
    deadline: Instant,
}

#[derive(Debug, Clone, Copy)]
struct MacroPlayer {
    steps: &'static [MacroStep],
    next: usize,
    resume_at: Option<Instant>,
}

impl MacroPlayer {
    /// Runs steps until a wait, the end of the macro, or `effects` getting full.
    /// Returns `true` once every step ran.
    fn run(&mut self, now: Instant, effects: &mut Effects) -> bool {
        while let Some(step) = self.steps.get(self.next) {
            if let Some(resume_at) = self.resume_at {
                if now < resume_at {
                    return false;
                }
                self.resume_at = None;
            }
            // a tap needs two slots and the next handle must still fit
            if effects.capacity() - effects.len() < 2 + HANDLE_RESERVE {
                return false;
            }
            match *step {
                MacroStep::Press(key) => emit(effects, KeyEffect::KeyDown(key)),
                MacroStep::Release(key) => emit(effects, KeyEffect::KeyUp(key)),
                MacroStep::Tap(key) => {
                    emit(effects, KeyEffect::KeyDown(key));
                    emit(effects, KeyEffect::KeyUp(key));
                }
                MacroStep::Wait(ms) => {
                    self.resume_at = Some(now + Duration::millis(ms as u64));
                }
            }
            self.next += 1;
        }
        true
    }
}

/// Turns debounced switch events into key effects and layer changes.
///
/// Every press commits to an effect (immediately, or once a hold-tap is decided) and the
/// release undoes exactly that effect, whatever the layer stack looks like by then.
/// At most one hold-tap or layer-tap waits for a decision at a time: any other press
/// decides it first.
pub struct Resolver<const ROWS: usize, const COLS: usize, const LAYERS: usize> {
    keymap: Keymap<ROWS, COLS, LAYERS>,
    layers: LayerStack<LAYERS>,
    hold_tap: HoldTapConfig,
    held: FnvIndexMap<MatrixCoordinate, Held, MAX_HELD>,
    pending: Option<PendingKey>,
    playing: Option<MacroPlayer>,
}

impl<const ROWS: usize, const COLS: usize, const LAYERS: usize> Resolver<ROWS, COLS, LAYERS> {
    /// Fails for grids with more switches than the resolver can track as held.
    pub fn new(
        keymap: Keymap<ROWS, COLS, LAYERS>,
        hold_tap: HoldTapConfig,
    ) -> Result<Self, Error> {
        ensure!(
            ROWS * COLS <= EVENT_QUEUE_LEN,
            MatrixTooLargeSnafu {
                keys: ROWS * COLS,
                capacity: EVENT_QUEUE_LEN,
            }
        );
        Ok(Resolver {
            keymap,
            layers: LayerStack::new(),
            hold_tap,
            held: FnvIndexMap::new(),
            pending: None,
            playing: None,
        })
    }

    pub fn layers(&self) -> &LayerStack<LAYERS> {
        &self.layers
    }

    pub fn keymap(&self) -> &Keymap<ROWS, COLS, LAYERS> {
        &self.keymap
    }

    /// The coordinate of the key waiting for a tap or hold decision.
    pub fn pending(&self) -> Option<MatrixCoordinate> {
        self.pending.map(|pending| pending.coordinate)
    }

    pub fn is_playing_macro(&self) -> bool {
        self.playing.is_some()
    }

    pub fn handle(&mut self, event: RawEvent, effects: &mut Effects) {
        let coordinate = event.coordinate;
        if coordinate.row as usize >= ROWS || coordinate.col as usize >= COLS {
            warn!("Ignoring event outside the keymap at {}", coordinate);
            return;
        }
        if event.pressed {
            if self.is_down(coordinate) {
                warn!("Ignoring second press of {}", coordinate);
                return;
            }
            if let Some(pending) = self.pending.take() {
                self.interrupt(pending, effects);
            }
            let action = self.layers.resolve(&self.keymap, coordinate);
            self.press(coordinate, action, event.time, effects);
        } else if let Some(pending) = self.pending.filter(|p| p.coordinate == coordinate) {
            self.pending = None;
            self.tap(pending, effects);
        } else if let Some(held) = self.held.remove(&coordinate) {
            self.release(held, effects);
        } else {
            debug!("Ignoring release of {} which is not down", coordinate);
        }
    }

    /// Settles expired hold-taps and advances macro playback.
    pub fn poll(&mut self, now: Instant, effects: &mut Effects) {
        if let Some(pending) = self.pending {
            if now >= pending.deadline {
                self.pending = None;
                debug!("{} held past timeout", pending.coordinate);
                self.confirm_hold(pending, effects);
            }
        }
        if let Some(player) = self.playing.as_mut() {
            if player.run(now, effects) {
                self.playing = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.layers.reset();
        self.held.clear();
        self.pending = None;
        self.playing = None;
    }

    fn is_down(&self, coordinate: MatrixCoordinate) -> bool {
        self.held.contains_key(&coordinate)
            || self.pending.is_some_and(|p| p.coordinate == coordinate)
    }

    fn press(
        &mut self,
        coordinate: MatrixCoordinate,
        action: KeyAction,
        now: Instant,
        effects: &mut Effects,
    ) {
        let deadline = now + self.hold_tap.timeout;
        let held = match action {
            KeyAction::NoOp | KeyAction::Transparent => Held::Nothing,
            KeyAction::Key(key) => {
                emit(effects, KeyEffect::KeyDown(key));
                Held::Key(key)
            }
            KeyAction::Modified(modifier, key) => {
                emit(effects, KeyEffect::KeyDown(modifier));
                emit(effects, KeyEffect::KeyDown(key));
                Held::Modified(modifier, key)
            }
            KeyAction::Momentary(layer) => {
                self.layers.activate(layer);
                Held::Layer(layer)
            }
            KeyAction::LayerToggle(layer) => {
                self.layers.toggle(layer);
                Held::Nothing
            }
            KeyAction::LayerTap(layer, fallback) => {
                self.layers.activate(layer);
                self.pending = Some(PendingKey {
                    coordinate,
                    kind: PendingKind::LayerTap { layer, fallback },
                    deadline,
                });
                return;
            }
            KeyAction::HoldTap(tap, hold) => {
                self.pending = Some(PendingKey {
                    coordinate,
                    kind: PendingKind::HoldTap { tap, hold },
                    deadline,
                });
                return;
            }
            KeyAction::Macro(steps) => {
                if self.playing.is_some() {
                    warn!("Ignoring macro at {} while another one plays", coordinate);
                } else {
                    let mut player = MacroPlayer {
                        steps,
                        next: 0,
                        resume_at: None,
                    };
                    if !player.run(now, effects) {
                        self.playing = Some(player);
                    }
                }
                Held::Nothing
            }
        };
        self.hold(coordinate, held);
    }

    fn release(&mut self, held: Held, effects: &mut Effects) {
        match held {
            Held::Key(key) => emit(effects, KeyEffect::KeyUp(key)),
            Held::Modified(modifier, key) => {
                emit(effects, KeyEffect::KeyUp(key));
                emit(effects, KeyEffect::KeyUp(modifier));
            }
            Held::Layer(layer) => self.layers.deactivate(layer),
            Held::Nothing => {}
        }
    }

    fn interrupt(&mut self, pending: PendingKey, effects: &mut Effects) {
        match (pending.kind, self.hold_tap.interrupt) {
            (PendingKind::HoldTap { tap, .. }, InterruptPolicy::TapOnInterrupt) => {
                debug!("{} interrupted, resolved as tap", pending.coordinate);
                emit(effects, KeyEffect::KeyDown(tap));
                self.hold(pending.coordinate, Held::Key(tap));
            }
            _ => {
                debug!("{} interrupted, resolved as hold", pending.coordinate);
                self.confirm_hold(pending, effects);
            }
        }
    }

    fn confirm_hold(&mut self, pending: PendingKey, effects: &mut Effects) {
        let held = match pending.kind {
            PendingKind::HoldTap { hold, .. } => {
                emit(effects, KeyEffect::KeyDown(hold));
                Held::Key(hold)
            }
            // the layer went active at press time already
            PendingKind::LayerTap { layer, .. } => Held::Layer(layer),
        };
        self.hold(pending.coordinate, held);
    }

    fn tap(&mut self, pending: PendingKey, effects: &mut Effects) {
        debug!("{} tapped", pending.coordinate);
        let key = match pending.kind {
            PendingKind::HoldTap { tap, .. } => tap,
            PendingKind::LayerTap { layer, fallback } => {
                self.layers.deactivate(layer);
                fallback
            }
        };
        emit(effects, KeyEffect::KeyDown(key));
        emit(effects, KeyEffect::KeyUp(key));
    }

    fn hold(&mut self, coordinate: MatrixCoordinate, held: Held) {
        if self.held.insert(coordinate, held).is_err() {
            error!("Too many keys held, dropping {}", coordinate);
        }
    }
}

fn emit(effects: &mut Effects, effect: KeyEffect) {
    if effects.push(effect).is_err() {
        error!("Effect buffer full, dropping {}", effect);
    }
}
