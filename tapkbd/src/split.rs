//! Merging a secondary half into the primary half's event stream.
//!
//! The secondary half runs a [`Scanner`](crate::matrix::Scanner) and a
//! [`SplitTransmitter`]. On the primary half a [`SplitReceiver`] runs in the transport
//! interrupt and hands frames to the [`SplitLink`] through a single-producer,
//! single-consumer queue; the link is then polled like any other event source.

mod connection;
mod error;
mod link;
mod message;
mod receiver;
mod transmitter;

pub use connection::{Connection, ConnectionExt};
pub use error::Error;
pub use link::{LinkState, SplitLink, Unsplit};
pub use message::{FrameDecoder, LinkFrame, Message, MAX_FRAME_LEN};
pub use receiver::SplitReceiver;
pub use transmitter::SplitTransmitter;

pub use heapless::spsc::{Consumer, Producer, Queue};
