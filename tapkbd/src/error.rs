use snafu::Snafu;

use crate::{config::Behavior, keyboard::LayerId, matrix::Half};

/// Configuration errors. All of them are detected while the [`Controller`] is built;
/// nothing in the scan loop returns this type.
///
/// [`Controller`]: crate::keyboard::Controller
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Debounce window must be at least one scan"))]
    ZeroDebounce,
    #[snafu(display("Hold-tap timeout must be longer than zero"))]
    ZeroHoldTapTimeout,
    #[snafu(display("Split link timeout must be longer than zero"))]
    ZeroLinkTimeout,
    #[snafu(display("Split behavior is enabled but no split layout is configured"))]
    MissingSplitConfig,
    #[snafu(display("{half:?} half columns {start}..{end} do not fit in {columns} columns"))]
    HalfOutOfRange {
        half: Half,
        start: u8,
        end: usize,
        columns: usize,
    },
    #[snafu(display("{half:?} half scans {rows} rows but the keymap has {grid_rows}"))]
    HalfRowsOutOfRange {
        half: Half,
        rows: usize,
        grid_rows: usize,
    },
    #[snafu(display("Both halves are bound to column {col}"))]
    DuplicateCoordinate { col: u8 },
    #[snafu(display("Keymap has no layers"))]
    NoLayers,
    #[snafu(display("Layer {layer} ({row}, {col}) refers to missing layer {target}"))]
    UnknownLayer {
        layer: LayerId,
        row: u8,
        col: u8,
        target: LayerId,
    },
    #[snafu(display("Base layer is transparent at ({row}, {col})"))]
    TransparentBaseLayer { row: u8, col: u8 },
    #[snafu(display("Layer {layer} ({row}, {col}) needs the {behavior:?} behavior"))]
    BehaviorDisabled {
        behavior: Behavior,
        layer: LayerId,
        row: u8,
        col: u8,
    },
    #[snafu(display("{keys} switches do not fit in an event queue of {capacity}"))]
    MatrixTooLarge { keys: usize, capacity: usize },
}
