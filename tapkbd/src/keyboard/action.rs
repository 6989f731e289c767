use super::Key;
use crate::config::Behavior;

/// Index into the keymap's layers. Layer 0 is the base layer.
pub type LayerId = u8;

/// What a switch does on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    NoOp,
    /// Use the action of the next lower active layer.
    Transparent,
    Key(Key),
    /// `Modified(modifier, key)` presses the modifier together with the key.
    Modified(Key, Key),
    /// `LayerTap(layer, fallback)` activates `layer` while held, types `fallback` when tapped.
    LayerTap(LayerId, Key),
    /// `HoldTap(tap, hold)`.
    HoldTap(Key, Key),
    LayerToggle(LayerId),
    /// Activates the layer while held.
    Momentary(LayerId),
    Macro(&'static [MacroStep]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroStep {
    Press(Key),
    Release(Key),
    Tap(Key),
    /// Pause playback for the given number of milliseconds.
    Wait(u32),
}

impl KeyAction {
    /// Whether the effect depends on how long the key is held.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, KeyAction::LayerTap(..) | KeyAction::HoldTap(..))
    }

    pub(crate) fn target_layer(&self) -> Option<LayerId> {
        match *self {
            KeyAction::LayerTap(layer, _)
            | KeyAction::LayerToggle(layer)
            | KeyAction::Momentary(layer) => Some(layer),
            _ => None,
        }
    }

    pub(crate) fn required_behavior(&self) -> Option<Behavior> {
        match self {
            KeyAction::LayerTap(..) | KeyAction::LayerToggle(_) | KeyAction::Momentary(_) => {
                Some(Behavior::Layers)
            }
            KeyAction::HoldTap(..) => Some(Behavior::HoldTap),
            KeyAction::Macro(_) => Some(Behavior::Macros),
            _ => None,
        }
    }
}
