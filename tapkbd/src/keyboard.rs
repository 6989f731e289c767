//! Key resolution: keymaps, the layer stack, hold-tap decisions and report building,
//! tied together by the [`Controller`].

mod action;
mod controller;
mod external_communicator;
mod key;
mod keyboard_state;
mod keymap;
mod layer;
mod report;
mod resolver;

pub use action::{KeyAction, LayerId, MacroStep};
pub use controller::{Controller, OUTBOX_LEN};
pub use external_communicator::ExternalCommunicator;
pub use key::Key;
pub use keyboard_state::KeyboardState;
pub use keymap::{Keymap, Layers};
pub use layer::LayerStack;
pub use report::{KeyboardReport, ReportBuilder, NUM_ROLLOVER};
pub use resolver::{Effects, KeyEffect, Resolver, MAX_EFFECTS};
