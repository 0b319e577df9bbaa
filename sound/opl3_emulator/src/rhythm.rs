//! # Rhythm Section
//!
//! With rhythm mode on, channels 6-8 become five drums:
//!
//! | Channel | Operator 0 | Operator 1 |
//! |---------|------------|------------|
//! | 6       | bass drum  | bass drum  |
//! | 7       | hi-hat     | snare      |
//! | 8       | tom        | cymbal     |
//!
//! The hi-hat, snare and cymbal don't use their own phase. Their phase is
//! assembled from bits of the hi-hat and cymbal accumulators and the noise
//! generator, which gives the metallic, noisy timbres.

use log::trace;

use crate::chip::LOG_TAG;
use crate::*;

/// Register 0xBD bit 5
pub const RHYTHM_ENABLE: u8 = 0x20;
pub const BASS_DRUM: u8 = 0x10;
pub const SNARE: u8 = 0x08;
pub const TOM: u8 = 0x04;
pub const CYMBAL: u8 = 0x02;
pub const HI_HAT: u8 = 0x01;

/// Operator slots of the drum voices
const BD_MODULATOR: usize = 12;
const BD_CARRIER: usize = 15;
const HH_SLOT: usize = 13;
const SD_SLOT: usize = 16;
const TT_SLOT: usize = 14;
const TC_SLOT: usize = 17;

/// Shared phase bit of hi-hat and cymbal
///
/// # Arguments
/// * `hh` - 10-bit phase of the hi-hat operator
/// * `tc` - 10-bit phase of the cymbal operator
pub fn phase_bit(hh: u16, tc: u16) -> u16 {
    let bit = (hh & 0x08) | (((hh >> 5) ^ hh) & 0x04) | (((tc >> 2) ^ tc) & 0x08);
    (bit != 0) as u16
}

pub fn hi_hat_phase(phase_bit: u16, noise: u16) -> u16 {
    (phase_bit << 9) | (0x34 << (phase_bit ^ (noise << 1)))
}

pub fn snare_phase(hh: u16, noise: u16) -> u16 {
    (0x100 << ((hh >> 8) & 0x01)) ^ (noise << 8)
}

pub fn cymbal_phase(phase_bit: u16) -> u16 {
    0x100 | (phase_bit << 9)
}

impl Chip {
    pub fn rhythm_enabled(&self) -> bool {
        self.rhythm & RHYTHM_ENABLE != 0
    }

    /// Register 0xBD: LFO depths, rhythm mode and the five drum keys
    ///
    /// Enabling rhythm mode re-routes channels 6-8 in the same write; every
    /// write with the mode on re-applies all five drum keys.
    pub(crate) fn write_bd(&mut self, val: u8) {
        self.tremolo_depth = val & 0x80 != 0;
        self.vibrato_depth = val & 0x40 != 0;

        let was_enabled = self.rhythm_enabled();
        self.rhythm = val & 0x3f;
        if was_enabled != self.rhythm_enabled() {
            trace!(target: LOG_TAG, "Rhythm mode {}", if was_enabled { "off" } else { "on" });
        }

        if !self.rhythm_enabled() {
            for ch in 6..9 {
                self.channels[ch].channel_type = ChannelType::TwoOperator;
                self.setup_algorithm(ch);
            }
            self.drum_key(&[BD_MODULATOR, HH_SLOT, TT_SLOT, BD_CARRIER, SD_SLOT, TC_SLOT], false);
            return;
        }

        self.channels[6].taps = [Some(BD_CARRIER), Some(BD_CARRIER), None, None];
        self.channels[7].taps = [Some(HH_SLOT), Some(HH_SLOT), Some(SD_SLOT), Some(SD_SLOT)];
        self.channels[8].taps = [Some(TT_SLOT), Some(TT_SLOT), Some(TC_SLOT), Some(TC_SLOT)];
        for ch in 6..9 {
            self.channels[ch].channel_type = ChannelType::Rhythm;
        }
        self.setup_algorithm(6);

        self.drum_key(&[HH_SLOT], val & HI_HAT != 0);
        self.drum_key(&[TC_SLOT], val & CYMBAL != 0);
        self.drum_key(&[TT_SLOT], val & TOM != 0);
        self.drum_key(&[SD_SLOT], val & SNARE != 0);
        self.drum_key(&[BD_MODULATOR, BD_CARRIER], val & BASS_DRUM != 0);
    }

    fn drum_key(&mut self, slots: &[usize], on: bool) {
        for &slot in slots {
            let ksv = self.channels[self.operators[slot].channel].pitch.ksv;
            if on {
                self.operators[slot].key_on(KeyKind::Rhythm, ksv);
            } else {
                self.operators[slot].key_off(KeyKind::Rhythm, ksv);
            }
        }
    }

    /// Current hi-hat/cymbal phase bit and the two source phases
    fn drum_phases(&self) -> (u16, u16) {
        let hh = self.operators[HH_SLOT].phase10();
        let tc = self.operators[TC_SLOT].phase10();
        (hh, phase_bit(hh, tc))
    }

    /// Outputs of the bass drum modulator, hi-hat and tom.
    /// Runs before the left mix.
    pub(crate) fn generate_rhythm_low(&mut self) {
        self.generate_operator(BD_MODULATOR);
        let (_, bit) = self.drum_phases();
        let noise = self.noise.bit();
        self.operators[HH_SLOT].generate_with_phase(hi_hat_phase(bit, noise));
        self.operators[TT_SLOT].generate(0);
    }

    /// Outputs of the bass drum carrier, snare and cymbal.
    /// Runs after the left mix.
    pub(crate) fn generate_rhythm_high(&mut self) {
        self.generate_operator(BD_CARRIER);
        let (hh, bit) = self.drum_phases();
        let noise = self.noise.bit();
        self.operators[SD_SLOT].generate_with_phase(snare_phase(hh, noise));
        self.operators[TC_SLOT].generate_with_phase(cymbal_phase(bit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_bit() {
        assert_eq!(phase_bit(0, 0), 0);
        assert_eq!(phase_bit(0x08, 0), 1);
        assert_eq!(phase_bit(0x04, 0), 1);
        assert_eq!(phase_bit(0x80, 0), 1);
        // hi-hat bits 2 and 7 cancel
        assert_eq!(phase_bit(0x84, 0), 0);
        assert_eq!(phase_bit(0, 0x20), 1);
        assert_eq!(phase_bit(0, 0x28), 0);
    }

    #[test]
    fn test_drum_phases() {
        assert_eq!(hi_hat_phase(0, 0), 0x34);
        assert_eq!(hi_hat_phase(1, 0), 0x200 | 0x68);
        assert_eq!(hi_hat_phase(0, 1), 0xd0);
        assert_eq!(hi_hat_phase(1, 1), 0x200 | 0x1a0);
        assert_eq!(snare_phase(0, 0), 0x100);
        assert_eq!(snare_phase(0x100, 0), 0x200);
        assert_eq!(snare_phase(0x100, 1), 0x300);
        assert_eq!(cymbal_phase(1), 0x300);
    }

    #[test]
    fn test_enable_rewires_channels() {
        let mut chip = Chip::new(false);
        chip.write_reg(0xbd, RHYTHM_ENABLE);
        assert!(chip.rhythm_enabled());
        for ch in 6..9 {
            assert_eq!(chip.channels[ch].channel_type(), ChannelType::Rhythm);
        }
        assert_eq!(chip.channels[6].taps(), [Some(15), Some(15), None, None]);
        assert_eq!(chip.channels[7].taps(), [Some(13), Some(13), Some(16), Some(16)]);

        chip.write_reg(0xbd, 0x00);
        for ch in 6..9 {
            assert_eq!(chip.channels[ch].channel_type(), ChannelType::TwoOperator);
        }
        assert_eq!(chip.channels[7].taps(), [Some(16), None, None, None]);
    }

    #[test]
    fn test_drum_keys() {
        let mut chip = Chip::new(false);
        chip.write_reg(0xbd, RHYTHM_ENABLE | BASS_DRUM | HI_HAT);
        assert!(chip.operators[12].is_keyed_by(KeyKind::Rhythm));
        assert!(chip.operators[15].is_keyed_by(KeyKind::Rhythm));
        assert!(chip.operators[13].is_keyed_by(KeyKind::Rhythm));
        assert!(!chip.operators[16].is_keyed());

        chip.write_reg(0xbd, RHYTHM_ENABLE | SNARE | TOM | CYMBAL);
        assert!(!chip.operators[12].is_keyed());
        assert!(!chip.operators[13].is_keyed());
        for slot in [14, 16, 17] {
            assert!(chip.operators[slot].is_keyed_by(KeyKind::Rhythm));
        }
    }

    #[test]
    fn test_disabling_rhythm_releases_drums() {
        let mut chip = Chip::new(false);
        chip.write_reg(0xb7, 0x20);
        chip.write_reg(0xbd, RHYTHM_ENABLE | SNARE);
        assert!(chip.operators[16].is_keyed_by(KeyKind::Rhythm));
        chip.write_reg(0xbd, 0x00);
        assert!(!chip.operators[16].is_keyed_by(KeyKind::Rhythm));
        // the melodic key on channel 7 survives
        assert!(chip.operators[16].is_keyed_by(KeyKind::Normal));
        assert!(chip.operators[13].is_keyed_by(KeyKind::Normal));
    }

    #[test]
    fn test_drum_keys_ignored_without_rhythm_mode() {
        let mut chip = Chip::new(false);
        chip.write_reg(0xbd, BASS_DRUM | SNARE | HI_HAT);
        for slot in 12..18 {
            assert!(!chip.operators[slot].is_keyed());
        }
    }

    #[test]
    fn test_lfo_depth_bits() {
        let mut chip = Chip::new(false);
        chip.write_reg(0xbd, 0xc0);
        assert!(chip.tremolo_depth);
        assert!(chip.vibrato_depth);
        assert!(!chip.rhythm_enabled());
    }
}
