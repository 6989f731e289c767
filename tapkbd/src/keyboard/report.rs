use heapless::Vec;

use super::{Key, KeyEffect};

/// Non-modifier keys a boot keyboard report can carry.
pub const NUM_ROLLOVER: usize = 6;
const MEDIA_SLOTS: usize = 4;
const REJECTED_SLOTS: usize = 16;

/// Snapshot of everything the host should see as held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub key_codes: [u8; NUM_ROLLOVER],
    pub media_usage_id: u16,
}

impl KeyboardReport {
    pub fn is_empty(&self) -> bool {
        *self == KeyboardReport::default()
    }
}

/// Reference-counted set of down keys.
///
/// A key-down that would need a seventh key slot is rejected: the keys already down stay
/// reported, [`ReportBuilder::overflow_count`] grows and the key-up matching that
/// rejected key-down is ignored. Other references on the same key keep their slot.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    keys: Vec<(Key, u8), NUM_ROLLOVER>,
    media: Vec<(Key, u8), MEDIA_SLOTS>,
    rejected: Vec<(Key, u8), REJECTED_SLOTS>,
    modifiers: [u8; 8],
    overflow_count: u32,
    report: KeyboardReport,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one effect, returning the new report if it differs from the last one.
    pub fn apply(&mut self, effect: KeyEffect) -> Option<KeyboardReport> {
        match effect {
            KeyEffect::KeyDown(key) => self.key_down(key),
            KeyEffect::KeyUp(key) => self.key_up(key),
        }
        let report = self.build();
        if report == self.report {
            None
        } else {
            self.report = report;
            Some(report)
        }
    }

    pub fn report(&self) -> KeyboardReport {
        self.report
    }

    /// Key-downs rejected because every key slot was taken.
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn key_down(&mut self, key: Key) {
        if key.is_media_key() {
            if !acquire(&mut self.media, key) {
                self.overflow(key);
            }
            return;
        }
        if key.key_code().is_some() && !acquire(&mut self.keys, key) {
            self.overflow(key);
            return;
        }
        if let Some(bit) = key.modifier_bit() {
            let count = &mut self.modifiers[bit as usize];
            *count = count.saturating_add(1);
        }
    }

    fn key_up(&mut self, key: Key) {
        if release(&mut self.rejected, key) {
            return;
        }
        if key.is_media_key() {
            release(&mut self.media, key);
            return;
        }
        if key.key_code().is_some() && !release(&mut self.keys, key) {
            return;
        }
        if let Some(bit) = key.modifier_bit() {
            let count = &mut self.modifiers[bit as usize];
            *count = count.saturating_sub(1);
        }
    }

    fn overflow(&mut self, key: Key) {
        self.overflow_count = self.overflow_count.wrapping_add(1);
        if !acquire(&mut self.rejected, key) {
            error!("Too many rejected keys, {} will be released early", key);
        }
        warn!(
            "Report full, dropping {} ({} dropped so far)",
            key, self.overflow_count
        );
    }

    fn build(&self) -> KeyboardReport {
        let mut report = KeyboardReport::default();
        report.modifier = self
            .modifiers
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .fold(0u8, |acc, (bit, _)| acc | 1u8 << bit);
        let mut len = 0;
        for code in self.keys.iter().filter_map(|(key, _)| key.key_code()) {
            // `!` and `1` share a usage
            if !report.key_codes[..len].contains(&code) {
                report.key_codes[len] = code;
                len += 1;
            }
        }
        report.media_usage_id = self
            .media
            .first()
            .and_then(|(key, _)| key.media_usage_id())
            .unwrap_or(0);
        report
    }
}

/// Takes a reference on `key`, claiming a new slot if needed. `false` when no slot is left.
fn acquire<const N: usize>(slots: &mut Vec<(Key, u8), N>, key: Key) -> bool {
    if let Some((_, count)) = slots.iter_mut().find(|(k, _)| *k == key) {
        *count = count.saturating_add(1);
        true
    } else {
        slots.push((key, 1)).is_ok()
    }
}

/// Drops a reference on `key`. `false` when `key` held no slot.
fn release<const N: usize>(slots: &mut Vec<(Key, u8), N>, key: Key) -> bool {
    let Some(index) = slots.iter().position(|(k, _)| *k == key) else {
        return false;
    };
    slots[index].1 -= 1;
    if slots[index].1 == 0 {
        slots.remove(index);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use KeyEffect::{KeyDown, KeyUp};

    #[test]
    fn only_changes_produce_reports() {
        let mut builder = ReportBuilder::new();
        let report = builder.apply(KeyDown(Key::A));
        assert_eq!(
            report,
            Some(KeyboardReport {
                key_codes: [0x04, 0, 0, 0, 0, 0],
                ..KeyboardReport::default()
            })
        );
        // held twice, reported once
        assert_eq!(builder.apply(KeyDown(Key::A)), None);
        assert_eq!(builder.apply(KeyUp(Key::A)), None);
        assert_eq!(builder.apply(KeyUp(Key::A)), Some(KeyboardReport::default()));
        assert_eq!(builder.apply(KeyUp(Key::A)), None);
    }

    #[test]
    fn seventh_key_is_rejected_and_counted() {
        let mut builder = ReportBuilder::new();
        for key in [Key::A, Key::B, Key::C, Key::D, Key::E, Key::F] {
            assert!(builder.apply(KeyDown(key)).is_some());
        }
        let full = builder.report();
        assert_eq!(full.key_codes, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);

        assert_eq!(builder.apply(KeyDown(Key::G)), None);
        assert_eq!(builder.apply(KeyDown(Key::H)), None);
        assert_eq!(builder.overflow_count(), 2);
        assert_eq!(builder.apply(KeyUp(Key::G)), None);
        assert_eq!(builder.report(), full);

        // modifiers do not need a key slot
        let report = builder.apply(KeyDown(Key::LeftControl));
        assert_eq!(report.map(|r| r.modifier), Some(0b0000_0001));

        let report = builder.apply(KeyUp(Key::C));
        assert_eq!(
            report.map(|r| r.key_codes),
            Some([0x04, 0x05, 0x07, 0x08, 0x09, 0])
        );
        assert_eq!(builder.overflow_count(), 2);
    }

    #[test]
    fn release_of_a_rejected_key_keeps_its_accepted_press() {
        let mut builder = ReportBuilder::new();
        for key in [Key::A, Key::B, Key::C, Key::D, Key::E, Key::F] {
            builder.apply(KeyDown(key));
        }
        assert_eq!(builder.apply(KeyDown(Key::G)), None);
        builder.apply(KeyUp(Key::C));
        let report = builder.apply(KeyDown(Key::G));
        assert_eq!(
            report.map(|r| r.key_codes),
            Some([0x04, 0x05, 0x07, 0x08, 0x09, 0x0a])
        );

        // the first key-up pairs with the rejected press
        assert_eq!(builder.apply(KeyUp(Key::G)), None);
        assert_eq!(builder.report().key_codes[5], 0x0a);
        let report = builder.apply(KeyUp(Key::G));
        assert_eq!(
            report.map(|r| r.key_codes),
            Some([0x04, 0x05, 0x07, 0x08, 0x09, 0])
        );
        assert_eq!(builder.apply(KeyUp(Key::G)), None);
        assert_eq!(builder.overflow_count(), 1);
    }

    #[test]
    fn modifier_bits_are_reference_counted() {
        let mut builder = ReportBuilder::new();
        builder.apply(KeyDown(Key::LeftShift));
        let report = builder.apply(KeyDown(Key::Exclamation));
        assert_eq!(
            report,
            Some(KeyboardReport {
                modifier: 0b0000_0010,
                key_codes: [0x1e, 0, 0, 0, 0, 0],
                media_usage_id: 0,
            })
        );
        assert_eq!(
            builder.apply(KeyUp(Key::LeftShift)).map(|r| r.modifier),
            None
        );
        let report = builder.apply(KeyUp(Key::Exclamation));
        assert_eq!(report, Some(KeyboardReport::default()));
    }

    #[test]
    fn media_keys_use_their_own_slot() {
        let mut builder = ReportBuilder::new();
        builder.apply(KeyDown(Key::MediaVolumeIncrement));
        builder.apply(KeyDown(Key::MediaMute));
        assert_eq!(builder.report().media_usage_id, 0xe9);
        assert_eq!(builder.report().key_codes, [0; NUM_ROLLOVER]);
        builder.apply(KeyUp(Key::MediaVolumeIncrement));
        assert_eq!(builder.report().media_usage_id, 0xe2);
        builder.apply(KeyUp(Key::MediaMute));
        assert!(builder.report().is_empty());
    }
}
