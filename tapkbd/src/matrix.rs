mod coordinate;
mod debounce;
mod key_matrix;
mod scanner;

pub use coordinate::{Half, MatrixCoordinate, RawEvent};
pub use debounce::Debouncer;
pub use key_matrix::{KeyMatrix, KeySwitches, RawMatrix};
pub use scanner::{EventQueue, EventSource, Scanner, EVENT_QUEUE_LEN};
