use crate::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Half {
    Primary,
    Secondary,
}

/// One physical switch in the unified grid of both halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixCoordinate {
    pub row: u8,
    pub col: u8,
    pub half: Half,
}

impl MatrixCoordinate {
    pub const fn new(row: u8, col: u8, half: Half) -> Self {
        MatrixCoordinate { row, col, half }
    }
}

/// A debounced transition of one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawEvent {
    pub coordinate: MatrixCoordinate,
    pub pressed: bool,
    pub time: Instant,
}

impl RawEvent {
    pub const fn press(coordinate: MatrixCoordinate, time: Instant) -> Self {
        RawEvent {
            coordinate,
            pressed: true,
            time,
        }
    }

    pub const fn release(coordinate: MatrixCoordinate, time: Instant) -> Self {
        RawEvent {
            coordinate,
            pressed: false,
            time,
        }
    }
}
