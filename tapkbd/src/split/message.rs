use core::fmt::Debug;

use heapless::Vec;

use super::Error;

/// Longest encoded frame.
pub const MAX_FRAME_LEN: usize = 3;

const PRESS: u8 = 0x00;
const RELEASE: u8 = 0x01;
const HEARTBEAT: u8 = 0xfe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Press { row: u8, col: u8 }, // 0x00
    Release { row: u8, col: u8 }, // 0x01
    Heartbeat,                  // 0xfe
}

impl Message {
    pub fn encode(&self) -> Vec<u8, MAX_FRAME_LEN> {
        let mut frame = Vec::new();
        let bytes: &[u8] = match *self {
            Message::Press { row, col } => &[PRESS, row, col],
            Message::Release { row, col } => &[RELEASE, row, col],
            Message::Heartbeat => &[HEARTBEAT],
        };
        // every frame fits in MAX_FRAME_LEN
        frame.extend_from_slice(bytes).ok();
        frame
    }
}

/// What the receiver hands over to the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkFrame {
    Message(Message),
    /// The transport reported an error; the secondary half can no longer be trusted.
    Lost,
}

/// Reassembles frames one byte at a time, so it can be fed from an interrupt.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl FrameDecoder {
    pub const fn new() -> Self {
        FrameDecoder {
            buf: [0; MAX_FRAME_LEN],
            len: 0,
        }
    }

    /// Consumes one byte. Returns a message once its last byte arrived.
    ///
    /// An unknown head byte is discarded so the next byte starts a new frame.
    pub fn push<E: Debug>(&mut self, byte: u8) -> Result<Option<Message>, Error<E>> {
        self.buf[self.len] = byte;
        self.len += 1;
        let message = match self.buf[..self.len] {
            [HEARTBEAT] => Message::Heartbeat,
            [PRESS, row, col] => Message::Press { row, col },
            [RELEASE, row, col] => Message::Release { row, col },
            [PRESS] | [RELEASE] | [PRESS, _] | [RELEASE, _] => return Ok(None),
            _ => {
                self.len = 0;
                return Err(Error::UnknownMessage { head: byte });
            }
        };
        self.len = 0;
        Ok(Some(message))
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }
}
