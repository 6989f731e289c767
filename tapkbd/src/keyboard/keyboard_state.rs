use super::{KeyboardReport, LayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct KeyboardState {
    /// Highest priority active layer.
    pub layer: LayerId,
    pub report: KeyboardReport,
    pub overflow_count: u32,
    /// Whether a hold-tap or layer-tap key is still undecided.
    pub pending: bool,
}
