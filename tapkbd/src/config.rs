//! Startup configuration: debounce window, hold-tap tunables, the enabled behavior
//! stages and the split layout.

use snafu::ensure;

use crate::{
    error::{
        DuplicateCoordinateSnafu, HalfOutOfRangeSnafu, MatrixTooLargeSnafu,
        MissingSplitConfigSnafu, ZeroDebounceSnafu, ZeroHoldTapTimeoutSnafu,
        ZeroLinkTimeoutSnafu,
    },
    matrix::{Half, MatrixCoordinate, EVENT_QUEUE_LEN},
    Duration, Error,
};

/// Consecutive scans a switch must disagree with its stable state before the change
/// is accepted. At a 1ms scan rate this is a 5ms window.
pub const DEFAULT_DEBOUNCE_TICKS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptPolicy {
    /// A press of another key resolves a pending hold-tap as its hold action.
    HoldOnInterrupt,
    /// A press of another key resolves a pending hold-tap as its tap action.
    TapOnInterrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HoldTapConfig {
    /// How long a hold-tap or layer-tap key may stay pressed and still count as a tap.
    pub timeout: Duration,
    pub interrupt: InterruptPolicy,
}

impl Default for HoldTapConfig {
    fn default() -> Self {
        HoldTapConfig {
            timeout: Duration::millis(300),
            interrupt: InterruptPolicy::HoldOnInterrupt,
        }
    }
}

/// Behavior stages a keyboard can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Behavior {
    /// Merge events from a secondary half.
    Split = 0,
    /// Momentary, toggle and layer-tap actions.
    Layers,
    /// Hold-tap actions.
    HoldTap,
    /// Key sequence macros.
    Macros,
}

/// The set of enabled [`Behavior`]s, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Behaviors(u8);

impl Behaviors {
    pub const fn none() -> Self {
        Behaviors(0)
    }

    pub const fn all() -> Self {
        Self::new(&[
            Behavior::Split,
            Behavior::Layers,
            Behavior::HoldTap,
            Behavior::Macros,
        ])
    }

    pub const fn new(behaviors: &[Behavior]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < behaviors.len() {
            bits |= 1 << behaviors[i] as u8;
            i += 1;
        }
        Behaviors(bits)
    }

    pub const fn with(self, behavior: Behavior) -> Self {
        Behaviors(self.0 | 1 << behavior as u8)
    }

    pub const fn contains(&self, behavior: Behavior) -> bool {
        self.0 & (1 << behavior as u8) != 0
    }
}

/// Where the two halves of a split keyboard land in the unified grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SplitConfig {
    /// Columns scanned by each half.
    pub half_columns: u8,
    /// First unified column of the primary half.
    pub primary_offset: u8,
    /// First unified column of the secondary half.
    pub secondary_offset: u8,
    /// The secondary half is wired right-to-left.
    pub mirrored: bool,
    /// Silence on the link longer than this marks the secondary half disconnected.
    pub link_timeout: Duration,
}

impl SplitConfig {
    pub const fn new(half_columns: u8) -> Self {
        SplitConfig {
            half_columns,
            primary_offset: 0,
            secondary_offset: half_columns,
            mirrored: false,
            link_timeout: Duration::millis(500),
        }
    }

    pub fn offset(&self, half: Half) -> u8 {
        match half {
            Half::Primary => self.primary_offset,
            Half::Secondary => self.secondary_offset,
        }
    }

    /// Maps a switch scanned on `half` into the unified grid.
    ///
    /// Returns `None` for columns the half does not have.
    pub fn translate(&self, half: Half, row: u8, col: u8) -> Option<MatrixCoordinate> {
        if col >= self.half_columns {
            return None;
        }
        let col = match half {
            Half::Secondary if self.mirrored => self.half_columns - 1 - col,
            _ => col,
        };
        Some(MatrixCoordinate {
            row,
            col: self.offset(half) + col,
            half,
        })
    }

    pub(crate) fn validate<const COLS: usize>(&self) -> Result<(), Error> {
        ensure!(self.link_timeout.ticks() > 0, ZeroLinkTimeoutSnafu);
        for half in [Half::Primary, Half::Secondary] {
            let start = self.offset(half);
            let end = start as usize + self.half_columns as usize;
            ensure!(
                end <= COLS,
                HalfOutOfRangeSnafu {
                    half,
                    start,
                    end,
                    columns: COLS,
                }
            );
        }
        let (primary, secondary) = (self.primary_offset, self.secondary_offset);
        let overlap_start = primary.max(secondary);
        let overlap_end = primary.min(secondary) as u16 + self.half_columns as u16;
        ensure!(
            self.half_columns == 0 || (overlap_start as u16) >= overlap_end,
            DuplicateCoordinateSnafu { col: overlap_start }
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub debounce_ticks: u8,
    pub hold_tap: HoldTapConfig,
    pub behaviors: Behaviors,
    pub split: Option<SplitConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debounce_ticks: DEFAULT_DEBOUNCE_TICKS,
            hold_tap: HoldTapConfig::default(),
            behaviors: Behaviors::new(&[Behavior::Layers, Behavior::HoldTap, Behavior::Macros]),
            split: None,
        }
    }
}

impl Config {
    /// Checks every tunable against a `ROWS` x `COLS` unified grid.
    pub fn validate<const ROWS: usize, const COLS: usize>(&self) -> Result<(), Error> {
        ensure!(self.debounce_ticks > 0, ZeroDebounceSnafu);
        ensure!(self.hold_tap.timeout.ticks() > 0, ZeroHoldTapTimeoutSnafu);
        ensure!(
            ROWS * COLS <= EVENT_QUEUE_LEN,
            MatrixTooLargeSnafu {
                keys: ROWS * COLS,
                capacity: EVENT_QUEUE_LEN,
            }
        );
        match (self.behaviors.contains(Behavior::Split), &self.split) {
            (true, None) => MissingSplitConfigSnafu.fail(),
            (true, Some(split)) => split.validate::<COLS>(),
            (false, _) => Ok(()),
        }
    }

    /// Column offset of the locally scanned half.
    pub fn primary_offset(&self) -> u8 {
        match (self.behaviors.contains(Behavior::Split), &self.split) {
            (true, Some(split)) => split.primary_offset,
            _ => 0,
        }
    }
}
