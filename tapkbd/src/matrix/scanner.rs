use heapless::Deque;
use snafu::ensure;

use super::{Debouncer, Half, KeySwitches, MatrixCoordinate, RawEvent, RawMatrix};
use crate::{
    config::Config,
    error::{HalfOutOfRangeSnafu, HalfRowsOutOfRangeSnafu, ZeroDebounceSnafu},
    fmt::Debug2Format,
    Error, Instant,
};

/// Capacity of the per-tick event queue. Every switch of the unified grid must fit.
pub const EVENT_QUEUE_LEN: usize = 64;

pub type EventQueue = Deque<RawEvent, EVENT_QUEUE_LEN>;

/// Anything that produces switch events once per tick.
pub trait EventSource {
    /// Appends the events observed up to `now` to `queue`, oldest first.
    fn poll(&mut self, now: Instant, queue: &mut EventQueue);

    /// Checks the source's own settings against a `ROWS` x `COLS` keymap before the
    /// first poll.
    fn validate<const ROWS: usize, const COLS: usize>(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// A debounced matrix of one half, translated into the unified grid.
pub struct Scanner<K, const ROWS: usize, const COLS: usize> {
    key_switches: K,
    debouncer: Debouncer<ROWS, COLS>,
    debounce_ticks: u8,
    raw: RawMatrix<ROWS, COLS>,
    half: Half,
    column_offset: u8,
}

impl<K: KeySwitches<ROWS, COLS>, const ROWS: usize, const COLS: usize> Scanner<K, ROWS, COLS> {
    pub fn new(key_switches: K, debounce_ticks: u8, half: Half, column_offset: u8) -> Self {
        Scanner {
            key_switches,
            debouncer: Debouncer::new(debounce_ticks),
            debounce_ticks,
            raw: [[false; COLS]; ROWS],
            half,
            column_offset,
        }
    }

    /// A scanner using the debounce window and column offset of `config`.
    ///
    /// The secondary half of a split keyboard scans in its own columns; the primary
    /// half translates them when they arrive.
    pub fn from_config(key_switches: K, config: &Config, half: Half) -> Self {
        let offset = match half {
            Half::Primary => config.primary_offset(),
            Half::Secondary => 0,
        };
        Self::new(key_switches, config.debounce_ticks, half, offset)
    }

    pub fn key_switches(&self) -> &K {
        &self.key_switches
    }

    pub fn key_switches_mut(&mut self) -> &mut K {
        &mut self.key_switches
    }

    pub fn reset(&mut self) {
        self.debouncer.reset();
        self.raw = [[false; COLS]; ROWS];
    }
}

impl<K: KeySwitches<ROWS, COLS>, const ROWS: usize, const COLS: usize> EventSource
    for Scanner<K, ROWS, COLS>
{
    fn poll(&mut self, now: Instant, queue: &mut EventQueue) {
        if let Err(e) = self.key_switches.scan(&mut self.raw) {
            warn!("Failed to scan {} half: {}", self.half, Debug2Format(&e));
            return;
        }
        let (half, offset) = (self.half, self.column_offset);
        self.debouncer.update(&self.raw, |row, col, pressed| {
            let event = RawEvent {
                coordinate: MatrixCoordinate::new(row, offset.saturating_add(col), half),
                pressed,
                time: now,
            };
            if queue.push_back(event).is_err() {
                error!("Event queue is full, dropping {}", event);
            }
        });
    }

    fn validate<const GRID_ROWS: usize, const GRID_COLS: usize>(&self) -> Result<(), Error> {
        ensure!(self.debounce_ticks > 0, ZeroDebounceSnafu);
        ensure!(
            ROWS <= GRID_ROWS,
            HalfRowsOutOfRangeSnafu {
                half: self.half,
                rows: ROWS,
                grid_rows: GRID_ROWS,
            }
        );
        let end = self.column_offset as usize + COLS;
        ensure!(
            end <= GRID_COLS,
            HalfOutOfRangeSnafu {
                half: self.half,
                start: self.column_offset,
                end,
                columns: GRID_COLS,
            }
        );
        Ok(())
    }
}
