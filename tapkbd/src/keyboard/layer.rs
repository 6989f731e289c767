use heapless::Vec;

use super::{KeyAction, Keymap, LayerId};
use crate::matrix::MatrixCoordinate;

/// Active layers, lowest priority first. The base layer 0 is always at the bottom.
///
/// Activations are counted per layer: a layer stays active until every `activate` got its
/// `deactivate`. A toggle counts as one activation of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStack<const LAYERS: usize> {
    active: Vec<LayerId, LAYERS>,
    activations: [u8; LAYERS],
    toggled: [bool; LAYERS],
}

impl<const LAYERS: usize> Default for LayerStack<LAYERS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LAYERS: usize> LayerStack<LAYERS> {
    pub fn new() -> Self {
        let mut active = Vec::new();
        active.push(0).ok();
        LayerStack {
            active,
            activations: [0; LAYERS],
            toggled: [false; LAYERS],
        }
    }

    /// Moves `layer` to the top, inserting it if needed, and counts one more activation.
    pub fn activate(&mut self, layer: LayerId) {
        if layer as usize >= LAYERS {
            warn!("Ignoring activation of missing layer {}", layer);
            return;
        }
        if layer == 0 {
            return;
        }
        let count = &mut self.activations[layer as usize];
        *count = count.saturating_add(1);
        if self.top() == layer {
            return;
        }
        self.active.retain(|&l| l != layer);
        // every layer appears at most once, so there is always room
        self.active.push(layer).ok();
    }

    /// Drops one activation of `layer`, removing it once none is left. The base layer stays.
    pub fn deactivate(&mut self, layer: LayerId) {
        if layer == 0 || layer as usize >= LAYERS {
            return;
        }
        let count = &mut self.activations[layer as usize];
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.active.retain(|&l| l != layer);
        }
    }

    pub fn toggle(&mut self, layer: LayerId) {
        if layer == 0 || layer as usize >= LAYERS {
            return;
        }
        let toggled = &mut self.toggled[layer as usize];
        *toggled = !*toggled;
        if *toggled {
            self.activate(layer);
        } else {
            self.deactivate(layer);
        }
    }

    pub fn is_active(&self, layer: LayerId) -> bool {
        self.active.contains(&layer)
    }

    /// The highest priority layer.
    pub fn top(&self) -> LayerId {
        self.active.last().copied().unwrap_or(0)
    }

    /// Active layers from lowest to highest priority.
    pub fn iter(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.active.iter().copied()
    }

    /// The first non-transparent action at `coordinate`, walking from the top layer down.
    pub fn resolve<const ROWS: usize, const COLS: usize>(
        &self,
        keymap: &Keymap<ROWS, COLS, LAYERS>,
        coordinate: MatrixCoordinate,
    ) -> KeyAction {
        let action = self
            .active
            .iter()
            .rev()
            .map(|&layer| keymap.action(layer, coordinate))
            .find(|action| *action != KeyAction::Transparent);
        debug_assert!(
            action.is_some(),
            "base layer is transparent at {:?}",
            coordinate
        );
        action.unwrap_or(KeyAction::NoOp)
    }

    pub fn reset(&mut self) {
        self.active.truncate(1);
        self.activations = [0; LAYERS];
        self.toggled = [false; LAYERS];
    }
}
