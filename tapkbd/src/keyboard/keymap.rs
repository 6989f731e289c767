use snafu::ensure;

use super::{KeyAction, LayerId};
use crate::{
    config::Behaviors,
    error::{BehaviorDisabledSnafu, NoLayersSnafu, TransparentBaseLayerSnafu, UnknownLayerSnafu},
    matrix::MatrixCoordinate,
    Error,
};

/// `layers[layer][row][col]`.
pub type Layers<const ROWS: usize, const COLS: usize, const LAYERS: usize> =
    [[[KeyAction; COLS]; ROWS]; LAYERS];

/// A validated, immutable keymap over the unified grid.
#[derive(Debug, Clone)]
pub struct Keymap<const ROWS: usize, const COLS: usize, const LAYERS: usize> {
    layers: Layers<ROWS, COLS, LAYERS>,
}

impl<const ROWS: usize, const COLS: usize, const LAYERS: usize> Keymap<ROWS, COLS, LAYERS> {
    /// Rejects keymaps without layers, with a transparent base layer, or with actions
    /// referring to layers that do not exist.
    pub fn new(layers: Layers<ROWS, COLS, LAYERS>) -> Result<Self, Error> {
        ensure!(LAYERS > 0, NoLayersSnafu);
        let keymap = Keymap { layers };
        for (layer, row, col, action) in keymap.actions() {
            ensure!(
                layer != 0 || action != KeyAction::Transparent,
                TransparentBaseLayerSnafu { row, col }
            );
            if let Some(target) = action.target_layer() {
                ensure!(
                    (target as usize) < LAYERS,
                    UnknownLayerSnafu {
                        layer,
                        row,
                        col,
                        target,
                    }
                );
            }
        }
        Ok(keymap)
    }

    /// Fails when an action needs a behavior stage that is not enabled.
    pub fn check_behaviors(&self, behaviors: Behaviors) -> Result<(), Error> {
        for (layer, row, col, action) in self.actions() {
            if let Some(behavior) = action.required_behavior() {
                ensure!(
                    behaviors.contains(behavior),
                    BehaviorDisabledSnafu {
                        behavior,
                        layer,
                        row,
                        col,
                    }
                );
            }
        }
        Ok(())
    }

    /// The action bound at `coordinate` on `layer`; `NoOp` outside the grid.
    pub fn action(&self, layer: LayerId, coordinate: MatrixCoordinate) -> KeyAction {
        self.layers
            .get(layer as usize)
            .and_then(|rows| rows.get(coordinate.row as usize))
            .and_then(|cols| cols.get(coordinate.col as usize))
            .copied()
            .unwrap_or(KeyAction::NoOp)
    }

    fn actions(&self) -> impl Iterator<Item = (LayerId, u8, u8, KeyAction)> + '_ {
        self.layers.iter().enumerate().flat_map(|(layer, rows)| {
            rows.iter().enumerate().flat_map(move |(row, cols)| {
                cols.iter()
                    .enumerate()
                    .map(move |(col, action)| (layer as LayerId, row as u8, col as u8, *action))
            })
        })
    }
}
