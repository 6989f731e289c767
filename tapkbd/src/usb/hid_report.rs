use usbd_hid::descriptor::{generator_prelude::*, MediaKeyboardReport};
use usbd_hid_macros::gen_hid_descriptor;

use crate::keyboard::KeyboardReport;

/// Boot protocol keyboard input report: modifier bits, a reserved byte and six key slots.
#[gen_hid_descriptor(
    (collection = APPLICATION, usage_page = GENERIC_DESKTOP, usage = KEYBOARD) = {
        (usage_page = KEYBOARD, usage_min = 0xe0, usage_max = 0xe7) = {
            #[packed_bits 8] #[item_settings data,variable,absolute] modifier=input;
        };
        (usage_min = 0x00, usage_max = 0xff) = {
            #[item_settings constant,variable,absolute] reserved=input;
        };
        (usage_page = KEYBOARD, usage_min = 0x00, usage_max = 0xdd) = {
            #[item_settings data,array,absolute] key_codes=input;
        };
    }
)]
#[repr(C)]
#[derive(PartialEq, Eq)]
pub struct HidKeyboardReport {
    pub modifier: u8,
    pub reserved: u8,
    pub key_codes: [u8; 6],
}

pub fn keyboard_report(report: &KeyboardReport) -> HidKeyboardReport {
    HidKeyboardReport {
        modifier: report.modifier,
        reserved: 0,
        key_codes: report.key_codes,
    }
}

pub fn media_report(report: &KeyboardReport) -> MediaKeyboardReport {
    MediaKeyboardReport {
        usage_id: report.media_usage_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_report_fields() {
        let report = KeyboardReport {
            modifier: 0b0010_0010,
            key_codes: [0x04, 0x1e, 0, 0, 0, 0],
            media_usage_id: 0xe9,
        };
        assert_eq!(
            keyboard_report(&report),
            HidKeyboardReport {
                modifier: 0b0010_0010,
                reserved: 0,
                key_codes: [0x04, 0x1e, 0, 0, 0, 0],
            }
        );
        assert_eq!({ media_report(&report).usage_id }, 0xe9);
        assert_eq!({ media_report(&KeyboardReport::default()).usage_id }, 0);
    }
}
