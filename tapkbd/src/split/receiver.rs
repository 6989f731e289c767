use heapless::spsc::Producer;

use super::{Connection, ConnectionExt, FrameDecoder, LinkFrame};

/// Interrupt-side half of the split link.
///
/// Never blocks: when the queue towards the scan loop is full the frame is dropped
/// and counted.
pub struct SplitReceiver<'a, C: Connection, const N: usize> {
    connection: C,
    producer: Producer<'a, LinkFrame, N>,
    decoder: FrameDecoder,
    dropped: u32,
}

impl<'a, C: Connection, const N: usize> SplitReceiver<'a, C, N> {
    pub fn new(connection: C, producer: Producer<'a, LinkFrame, N>) -> Self {
        SplitReceiver {
            connection,
            producer,
            decoder: FrameDecoder::new(),
            dropped: 0,
        }
    }

    /// Drains the connection. Call from the transport's receive interrupt.
    pub fn poll(&mut self) {
        let producer = &mut self.producer;
        let dropped = &mut self.dropped;
        let result = self.connection.read_messages(
            &mut self.decoder,
            |message| enqueue(producer, dropped, LinkFrame::Message(message)),
            |e| warn!("Discarding split frame: {}", e),
        );
        if let Err(e) = result {
            warn!("Split connection failed: {}", e);
            enqueue(producer, dropped, LinkFrame::Lost);
        }
    }

    /// Frames lost because the scan loop fell behind.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }
}

fn enqueue<const N: usize>(
    producer: &mut Producer<'_, LinkFrame, N>,
    dropped: &mut u32,
    frame: LinkFrame,
) {
    if producer.enqueue(frame).is_err() {
        *dropped = dropped.saturating_add(1);
        warn!("Split queue is full, dropping {}", frame);
    }
}
