use core::fmt::Debug;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[snafu(visibility(pub(crate)))]
pub enum Error<E: 'static + Debug> {
    #[snafu(display("Read from connection failed: {error:?}"))]
    ReadFailed {
        #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
        error: E,
    },
    #[snafu(display("Unknown message with type {head:#04x}"))]
    UnknownMessage { head: u8 },
}
