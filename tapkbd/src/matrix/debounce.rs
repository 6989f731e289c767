//! Per-key debounce logic.
//!
//! Every switch must read the same new level for `threshold` consecutive scans before
//! its debounced state flips. A reading that returns to the stable level earlier
//! cancels the candidate change without emitting anything.

use super::RawMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchState {
    Stable(bool),
    Settling { stable: bool, count: u8 },
}

impl SwitchState {
    fn is_pressed(&self) -> bool {
        match *self {
            SwitchState::Stable(pressed) => pressed,
            SwitchState::Settling { stable, .. } => stable,
        }
    }
}

pub struct Debouncer<const ROWS: usize, const COLS: usize> {
    states: [[SwitchState; COLS]; ROWS],
    threshold: u8,
}

impl<const ROWS: usize, const COLS: usize> Debouncer<ROWS, COLS> {
    pub const fn new(threshold: u8) -> Self {
        Debouncer {
            states: [[SwitchState::Stable(false); COLS]; ROWS],
            threshold,
        }
    }

    /// Feeds one raw scan and calls `on_change(row, col, pressed)` for every switch whose
    /// debounced state flipped, in row-major order.
    pub fn update(&mut self, raw: &RawMatrix<ROWS, COLS>, mut on_change: impl FnMut(u8, u8, bool)) {
        for (row, (states, levels)) in self.states.iter_mut().zip(raw.iter()).enumerate() {
            for (col, (state, &level)) in states.iter_mut().zip(levels.iter()).enumerate() {
                let next = match *state {
                    SwitchState::Stable(stable) if stable == level => continue,
                    SwitchState::Settling { stable, .. } if stable == level => {
                        SwitchState::Stable(stable)
                    }
                    SwitchState::Stable(stable) => SwitchState::Settling { stable, count: 1 },
                    SwitchState::Settling { stable, count } => SwitchState::Settling {
                        stable,
                        count: count.saturating_add(1),
                    },
                };
                *state = match next {
                    SwitchState::Settling { count, .. } if count >= self.threshold => {
                        on_change(row as u8, col as u8, level);
                        SwitchState::Stable(level)
                    }
                    next => next,
                };
            }
        }
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.states
            .get(row)
            .and_then(|states| states.get(col))
            .map(SwitchState::is_pressed)
            .unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.states = [[SwitchState::Stable(false); COLS]; ROWS];
    }
}
