use usb_device::{
    class_prelude::{UsbBus, UsbBusAllocator},
    device::{StringDescriptors, UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid},
    prelude::BuilderError,
    LangID, UsbError,
};
use usbd_hid::{
    descriptor::{MediaKeyboardReport, SerializedDescriptor},
    hid_class::HIDClass,
};

use super::{keyboard_report, media_report, DeviceInfo, HidKeyboardReport};
use crate::keyboard::{ExternalCommunicator, KeyboardReport};

/// Poll interval requested for both HID endpoints, in milliseconds.
const POLL_MS: u8 = 10;

/// A composite USB device with a keyboard interface and a media key interface.
pub struct UsbCommunicator<'a, B: UsbBus> {
    usb_device: UsbDevice<'a, B>,
    keyboard_usb_hid: HIDClass<'a, B>,
    media_usb_hid: HIDClass<'a, B>,
}

impl<'a, B: UsbBus> UsbCommunicator<'a, B> {
    pub fn new(
        device_info: DeviceInfo,
        usb_bus_alloc: &'a UsbBusAllocator<B>,
    ) -> Result<Self, BuilderError> {
        let keyboard_usb_hid = HIDClass::new(usb_bus_alloc, HidKeyboardReport::desc(), POLL_MS);
        let media_usb_hid = HIDClass::new(usb_bus_alloc, MediaKeyboardReport::desc(), POLL_MS);
        let descriptors = StringDescriptors::new(LangID::EN_US)
            .manufacturer(device_info.manufacturer)
            .serial_number(device_info.serial_number)
            .product(device_info.product_name);
        let usb_device = UsbDeviceBuilder::new(
            usb_bus_alloc,
            UsbVidPid(device_info.vendor_id, device_info.product_id),
        )
        .strings(&[descriptors])?
        .device_class(0)
        .build();

        Ok(UsbCommunicator {
            usb_device,
            keyboard_usb_hid,
            media_usb_hid,
        })
    }

    /// Must be called from the USB interrupt or at least every 10ms.
    pub fn poll(&mut self) -> bool {
        self.usb_device
            .poll(&mut [&mut self.keyboard_usb_hid, &mut self.media_usb_hid])
    }

    pub fn state(&self) -> UsbDeviceState {
        self.usb_device.state()
    }
}

impl<'a, B: UsbBus> ExternalCommunicator for UsbCommunicator<'a, B> {
    type Error = UsbError;

    fn is_ready(&self) -> bool {
        self.usb_device.state() == UsbDeviceState::Configured
    }

    fn send_report(&self, report: &KeyboardReport) -> Result<(), UsbError> {
        self.keyboard_usb_hid.push_input(&keyboard_report(report))?;
        self.media_usb_hid.push_input(&media_report(report))?;
        Ok(())
    }
}
