//! USB HID transport for [`KeyboardReport`](crate::keyboard::KeyboardReport)s.

mod device_info;
mod hid_report;
mod usb_communicator;

pub use device_info::DeviceInfo;
pub use hid_report::{keyboard_report, media_report, HidKeyboardReport};
pub use usb_communicator::UsbCommunicator;
