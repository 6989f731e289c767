use core::fmt::Debug;

use super::{Error, FrameDecoder, Message};

/// Byte transport between the halves, e.g. a UART.
pub trait Connection {
    type Error: 'static + Debug;

    /// Reads whatever bytes are available without blocking.
    fn read_raw(&self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error>;

    fn write(&self, data: &[u8]);
}

/// Bytes drained from the connection per read.
const READ_CHUNK_LEN: usize = 16;

pub trait ConnectionExt: Connection {
    fn send_message(&self, message: Message) {
        self.write(&message.encode());
    }

    /// Decodes every complete frame currently available, calling `on_message` for each.
    ///
    /// Stops when the connection would block. An unknown head byte is reported to
    /// `on_error` and decoding resumes with the next byte; a read error ends the call.
    fn read_messages(
        &self,
        decoder: &mut FrameDecoder,
        mut on_message: impl FnMut(Message),
        mut on_error: impl FnMut(&Error<Self::Error>),
    ) -> Result<(), Error<Self::Error>> {
        let mut buf = [0u8; READ_CHUNK_LEN];
        loop {
            let len = match self.read_raw(&mut buf) {
                Ok(0) | Err(nb::Error::WouldBlock) => return Ok(()),
                Ok(len) => len,
                Err(nb::Error::Other(error)) => {
                    decoder.reset();
                    return Err(Error::ReadFailed { error });
                }
            };
            for &byte in &buf[..len] {
                match decoder.push(byte) {
                    Ok(Some(message)) => on_message(message),
                    Ok(None) => {}
                    Err(e) => on_error(&e),
                }
            }
        }
    }
}

impl<T: Connection> ConnectionExt for T {}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use core::cell::RefCell;
    use std::{collections::VecDeque, rc::Rc, vec::Vec};

    use super::*;

    /// Both ends of an in-memory wire. Writes on one end become readable on the other.
    #[derive(Clone, Default)]
    pub(crate) struct Loopback {
        pub(crate) bytes: Rc<RefCell<VecDeque<u8>>>,
        pub(crate) broken: Rc<RefCell<bool>>,
    }

    impl Connection for Loopback {
        type Error = &'static str;

        fn read_raw(&self, buffer: &mut [u8]) -> nb::Result<usize, &'static str> {
            if *self.broken.borrow() {
                return Err(nb::Error::Other("wire cut"));
            }
            let mut bytes = self.bytes.borrow_mut();
            if bytes.is_empty() {
                return Err(nb::Error::WouldBlock);
            }
            let len = buffer.len().min(bytes.len());
            for slot in buffer[..len].iter_mut() {
                *slot = bytes.pop_front().unwrap_or_default();
            }
            Ok(len)
        }

        fn write(&self, data: &[u8]) {
            self.bytes.borrow_mut().extend(data.iter().copied());
        }
    }

    #[test]
    fn messages_survive_the_wire() {
        let wire = Loopback::default();
        wire.send_message(Message::Press { row: 1, col: 2 });
        wire.send_message(Message::Heartbeat);
        wire.write(&[0x77]);
        wire.send_message(Message::Release { row: 1, col: 2 });

        let mut decoder = FrameDecoder::new();
        let mut messages = Vec::new();
        let mut errors = 0;
        let result = wire.read_messages(&mut decoder, |m| messages.push(m), |_| errors += 1);
        assert!(result.is_ok());
        assert_eq!(
            messages,
            [
                Message::Press { row: 1, col: 2 },
                Message::Heartbeat,
                Message::Release { row: 1, col: 2 },
            ]
        );
        assert_eq!(errors, 1);
    }

    #[test]
    fn read_errors_are_returned() {
        let wire = Loopback::default();
        *wire.broken.borrow_mut() = true;
        let mut decoder = FrameDecoder::new();
        let result = wire.read_messages(&mut decoder, |_| {}, |_: &Error<&'static str>| {});
        assert!(matches!(result, Err(Error::ReadFailed { error: "wire cut" })));
    }
}
