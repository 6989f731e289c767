//! Keyboard firmware core: matrix scanning, split-half merging, hold-tap resolution,
//! layers and HID report building.
//!
//! Everything runs inside one cooperative [`keyboard::Controller::tick`]; hardware is
//! reached only through the traits in [`matrix`], [`split`] and [`keyboard`].
#![no_std]

extern crate self as tapkbd;

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod keyboard;
pub mod matrix;
pub mod split;
pub mod usb;

pub use error::Error;
pub use heapless::Vec;
pub use tapkbd_macros::layout;

/// Monotonic tick timestamp with millisecond resolution.
pub type Instant = fugit::TimerInstantU64<1_000>;
/// Span between two [`Instant`]s.
pub type Duration = fugit::TimerDurationU64<1_000>;
