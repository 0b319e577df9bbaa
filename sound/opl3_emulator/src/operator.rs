//! # Operator Implementation
//!
//! Envelope generator, phase generator and register writes of a single
//! operator. Anything an operator needs from its channel or the chip (pitch,
//! feedback amount, LFO state, the sample counter) is passed in by the caller,
//! which keeps the operator plain data.

use crate::tables::{
    EG_INC_DESC, EG_INC_SHIFT, EG_INC_STEP, KSL_ROM, KSL_SHIFT, MULTIPLIER,
};
use crate::*;

impl Operator {
    /// Creates a silent operator belonging to `channel`
    pub fn new(channel: usize) -> Self {
        Self {
            channel,
            ..Default::default()
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn envelope_state(&self) -> EnvelopeState {
        self.eg_state
    }

    /// Envelope attenuation, 0 (loudest) to 0x1ff (silent)
    pub fn attenuation(&self) -> u16 {
        self.eg_rout as u16
    }

    /// Total attenuation used for the last output sample
    pub fn total_attenuation(&self) -> u16 {
        self.eg_out
    }

    /// Combined envelope rate of the current state
    pub fn rate(&self) -> u8 {
        self.eg_rate
    }

    /// Raw phase accumulator
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// The 10-bit waveform phase
    pub fn phase10(&self) -> u16 {
        ((self.phase >> 9) & 0x3ff) as u16
    }

    pub fn output(&self) -> i16 {
        self.out
    }

    pub fn feedback_modulation(&self) -> i16 {
        self.fb_mod
    }

    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn is_keyed(&self) -> bool {
        self.key != 0
    }

    pub fn is_keyed_by(&self, kind: KeyKind) -> bool {
        self.key & kind as u8 != 0
    }

    pub(crate) fn set_modulation(&mut self, modulation: Modulation) {
        self.modulation = modulation;
    }

    /// Combines a register rate with key scaling
    ///
    /// # Arguments
    /// * `reg_rate` - The 4-bit AR/DR/RR register value
    /// * `ksv` - The channel's key scale value
    ///
    /// # Returns
    /// The combined rate, 0 when the register rate is 0
    fn calc_rate(&self, reg_rate: u8, ksv: u8) -> u8 {
        if reg_rate == 0 {
            return 0;
        }
        let scale = if self.ksr { ksv } else { ksv >> 2 };
        ((reg_rate << 2) + scale).min(RATE_MAX)
    }

    /// Recomputes the rate for the current envelope state
    pub(crate) fn update_rate(&mut self, ksv: u8) {
        self.eg_rate = match self.eg_state {
            EnvelopeState::Off => 0,
            EnvelopeState::Attack => self.calc_rate(self.attack, ksv),
            EnvelopeState::Decay => self.calc_rate(self.decay, ksv),
            EnvelopeState::Sustain | EnvelopeState::Release => self.calc_rate(self.release, ksv),
        };
    }

    /// Recomputes the key scale level attenuation for a new pitch
    pub(crate) fn update_ksl(&mut self, pitch: Pitch) {
        let ksl = ((KSL_ROM[(pitch.f_num >> 6) as usize & 0x0f] as i16) << 2)
            - ((8 - pitch.block as i16) << 5);
        self.eg_ksl = ksl.max(0) as u8;
    }

    /// Switches envelope state and picks up the matching rate
    fn set_state(&mut self, state: EnvelopeState, ksv: u8) {
        self.eg_state = state;
        self.update_rate(ksv);
    }

    /// Keys the operator on
    ///
    /// Only the first key source restarts the envelope and phase. An attack
    /// rate of 15 (after key scaling) skips straight to decay at full volume.
    ///
    /// # Arguments
    /// * `kind` - Which key source is pressing the note
    /// * `ksv` - The channel's key scale value
    pub(crate) fn key_on(&mut self, kind: KeyKind, ksv: u8) {
        if self.key == 0 {
            self.set_state(EnvelopeState::Attack, ksv);
            if self.eg_rate >> 2 == 0x0f {
                self.set_state(EnvelopeState::Decay, ksv);
                self.eg_rout = 0;
            }
            self.phase = 0;
        }
        self.key |= kind as u8;
    }

    /// Releases one key source, entering release once none are left
    pub(crate) fn key_off(&mut self, kind: KeyKind, ksv: u8) {
        if self.key != 0 {
            self.key &= !(kind as u8);
            if self.key == 0 {
                self.set_state(EnvelopeState::Release, ksv);
            }
        }
    }

    /// Envelope increment for this sample
    fn envelope_increment(&self, timer: u64) -> u8 {
        let rate_h = (self.eg_rate >> 2) as usize;
        let rate_l = (self.eg_rate & 3) as usize;
        let steps = &EG_INC_STEP[EG_INC_DESC[rate_h] as usize][rate_l];
        let shift = EG_INC_SHIFT[rate_h];
        if shift > 0 {
            if timer & ((1 << shift) - 1) == 0 {
                steps[((timer >> shift) & 0x07) as usize]
            } else {
                0
            }
        } else {
            steps[(timer & 0x07) as usize] << (-shift)
        }
    }

    /// Advances the envelope generator by one sample
    ///
    /// The output attenuation is latched from the level before this sample's
    /// step, as the hardware does.
    ///
    /// # Arguments
    /// * `timer` - Chip sample counter
    /// * `tremolo` - Current tremolo attenuation, applied if enabled
    /// * `ksv` - The channel's key scale value, for rate changes
    pub(crate) fn advance_envelope(&mut self, timer: u64, tremolo: u8, ksv: u8) {
        self.eg_inc = self.envelope_increment(timer);
        let tremolo = if self.tremolo { tremolo } else { 0 };
        self.eg_out = (self.eg_rout as i32
            + ((self.total_level as i32) << 2)
            + ((self.eg_ksl as u16) >> KSL_SHIFT[self.ksl as usize]) as i32
            + tremolo as i32) as u16;

        match self.eg_state {
            EnvelopeState::Off => self.eg_rout = ENV_SILENT,
            EnvelopeState::Attack => {
                if self.eg_rout == 0 {
                    self.set_state(EnvelopeState::Decay, ksv);
                    return;
                }
                self.eg_rout += (((!self.eg_rout) as i32 * self.eg_inc as i32) >> 3) as i16;
                if self.eg_rout < 0 {
                    self.eg_rout = 0;
                }
            }
            EnvelopeState::Decay => {
                if self.eg_rout >= (self.sustain_level as i16) << 4 {
                    self.set_state(EnvelopeState::Sustain, ksv);
                    return;
                }
                self.eg_rout += self.eg_inc as i16;
            }
            EnvelopeState::Sustain if self.sustained => {}
            EnvelopeState::Sustain | EnvelopeState::Release => {
                if self.eg_rout >= ENV_SILENT {
                    self.set_state(EnvelopeState::Off, ksv);
                    self.eg_rout = ENV_SILENT;
                    return;
                }
                // stops at silence, the next sample turns the operator off
                self.eg_rout = (self.eg_rout + self.eg_inc as i16).min(ENV_SILENT);
            }
        }
    }

    /// Advances the phase accumulator by one sample
    ///
    /// # Arguments
    /// * `pitch` - The channel's pitch
    /// * `timer` - Chip sample counter, drives the vibrato position
    /// * `deep_vibrato` - Register 0xBD bit 6
    pub(crate) fn advance_phase(&mut self, pitch: Pitch, timer: u64, deep_vibrato: bool) {
        let mut f_num = pitch.f_num;
        if self.vibrato {
            let mut range = ((f_num >> 7) & 0x07) as i16;
            let position = (timer >> 10) & 0x07;
            if position & 3 == 0 {
                range = 0;
            } else if position & 1 != 0 {
                range >>= 1;
            }
            if !deep_vibrato {
                range >>= 1;
            }
            if position & 4 != 0 {
                range = -range;
            }
            f_num = f_num.wrapping_add(range as u16);
        }
        let base = ((f_num as u32) << pitch.block) >> 1;
        self.phase = self
            .phase
            .wrapping_add((base * MULTIPLIER[self.mult as usize] as u32) >> 1);
    }

    /// Shifts the last output into the feedback history
    ///
    /// # Arguments
    /// * `feedback` - The channel feedback amount, 0 disables feedback
    pub(crate) fn update_feedback(&mut self, feedback: u8) {
        self.prev_out[1] = self.prev_out[0];
        self.prev_out[0] = self.out;
        self.fb_mod = if feedback != 0 {
            ((self.prev_out[0] as i32 + self.prev_out[1] as i32) >> (9 - feedback)) as i16
        } else {
            0
        };
    }

    /// Produces the output sample from the accumulator plus `modulation`
    pub(crate) fn generate(&mut self, modulation: i16) {
        let phase = ((self.phase >> 9) as u16).wrapping_add(modulation as u16);
        self.out = self.waveform.sample(phase, self.eg_out);
    }

    /// Produces the output sample from an externally computed phase
    pub(crate) fn generate_with_phase(&mut self, phase: u16) {
        self.out = self.waveform.sample(phase, self.eg_out);
    }

    /// Register 0x20: tremolo, vibrato, sustain, KSR, multiplier
    pub(crate) fn write_20(&mut self, val: u8, ksv: u8) {
        self.tremolo = val & 0x80 != 0;
        self.vibrato = val & 0x40 != 0;
        self.sustained = val & 0x20 != 0;
        self.ksr = val & 0x10 != 0;
        self.mult = val & 0x0f;
        self.update_rate(ksv);
    }

    /// Register 0x40: key scale level, total level
    pub(crate) fn write_40(&mut self, val: u8, pitch: Pitch) {
        self.ksl = (val >> 6) & 0x03;
        self.total_level = val & 0x3f;
        self.update_ksl(pitch);
    }

    /// Register 0x60: attack rate, decay rate
    pub(crate) fn write_60(&mut self, val: u8, ksv: u8) {
        self.attack = (val >> 4) & 0x0f;
        self.decay = val & 0x0f;
        self.update_rate(ksv);
    }

    /// Register 0x80: sustain level, release rate
    pub(crate) fn write_80(&mut self, val: u8, ksv: u8) {
        self.sustain_level = (val >> 4) & 0x0f;
        if self.sustain_level == 0x0f {
            self.sustain_level = 0x1f;
        }
        self.release = val & 0x0f;
        self.update_rate(ksv);
    }

    /// Register 0xE0: waveform, only the low two bits outside OPL3 mode
    pub(crate) fn write_e0(&mut self, val: u8, new_mode: bool) {
        let mask = if new_mode { 0x07 } else { 0x03 };
        self.waveform = Waveform::from_bits(val & mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PITCH: Pitch = Pitch {
        f_num: 0x200,
        block: 4,
        ksv: 8,
    };

    fn run_envelope(op: &mut Operator, from: u64, samples: u64) -> Vec<u16> {
        (from..from + samples)
            .map(|timer| {
                op.advance_envelope(timer, 0, PITCH.ksv);
                op.attenuation()
            })
            .collect()
    }

    #[test]
    fn test_calc_rate() {
        let mut op = Operator::new(0);
        assert_eq!(op.calc_rate(0, 15), 0);
        assert_eq!(op.calc_rate(4, 9), 18);
        op.ksr = true;
        assert_eq!(op.calc_rate(4, 9), 25);
        assert_eq!(op.calc_rate(15, 15), RATE_MAX);
    }

    #[test]
    fn test_ksl_attenuation() {
        let mut op = Operator::new(0);
        op.update_ksl(Pitch {
            f_num: 0x3ff,
            block: 7,
            ksv: 0,
        });
        assert_eq!(op.eg_ksl, 224);
        op.update_ksl(Pitch {
            f_num: 0x3ff,
            block: 0,
            ksv: 0,
        });
        assert_eq!(op.eg_ksl, 0);
    }

    #[test]
    fn test_key_on_starts_attack() {
        let mut op = Operator::new(0);
        op.write_60(0x40, PITCH.ksv);
        op.phase = 0x1234;
        op.key_on(KeyKind::Normal, PITCH.ksv);
        assert_eq!(op.envelope_state(), EnvelopeState::Attack);
        assert_eq!(op.rate(), 16 + 2);
        assert_eq!(op.phase(), 0);
    }

    #[test]
    fn test_max_attack_skips_to_decay() {
        let mut op = Operator::new(0);
        op.write_60(0xf4, PITCH.ksv);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        assert_eq!(op.envelope_state(), EnvelopeState::Decay);
        assert_eq!(op.attenuation(), 0);
    }

    #[test]
    fn test_attack_is_non_increasing() {
        let mut op = Operator::new(0);
        op.write_60(0x60, PITCH.ksv);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        let levels = run_envelope(&mut op, 0, 20_000);
        assert!(levels.windows(2).all(|w| w[1] <= w[0]));
        assert_ne!(op.envelope_state(), EnvelopeState::Attack);
    }

    #[test]
    fn test_decay_stops_at_sustain_level() {
        let mut op = Operator::new(0);
        op.write_20(0x20, PITCH.ksv);
        op.write_60(0xf8, PITCH.ksv);
        op.write_80(0x40, PITCH.ksv);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        let levels = run_envelope(&mut op, 0, 50_000);
        assert!(levels.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(op.envelope_state(), EnvelopeState::Sustain);
        let held = op.attenuation();
        assert!(held >= 4 << 4);
        let levels = run_envelope(&mut op, 50_000, 10_000);
        assert!(levels.iter().all(|l| *l == held));
    }

    #[test]
    fn test_percussive_sustain_releases() {
        let mut op = Operator::new(0);
        op.write_60(0xff, PITCH.ksv);
        op.write_80(0x0f, PITCH.ksv);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        run_envelope(&mut op, 0, 5_000);
        assert!(op.is_keyed());
        assert_eq!(op.envelope_state(), EnvelopeState::Off);
        assert_eq!(op.attenuation(), 0x1ff);
    }

    #[test]
    fn test_key_sources_are_independent() {
        let mut op = Operator::new(0);
        op.write_60(0xf0, PITCH.ksv);
        op.write_80(0x0f, PITCH.ksv);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        op.key_on(KeyKind::Rhythm, PITCH.ksv);
        op.key_off(KeyKind::Normal, PITCH.ksv);
        assert!(op.is_keyed_by(KeyKind::Rhythm));
        assert_ne!(op.envelope_state(), EnvelopeState::Release);
        op.key_off(KeyKind::Rhythm, PITCH.ksv);
        assert_eq!(op.envelope_state(), EnvelopeState::Release);
        // releasing an idle operator is a no-op
        op.key_off(KeyKind::Rhythm, PITCH.ksv);
        assert_eq!(op.envelope_state(), EnvelopeState::Release);
    }

    #[test]
    fn test_zero_rate_never_progresses() {
        let mut op = Operator::new(0);
        op.key_on(KeyKind::Normal, PITCH.ksv);
        let levels = run_envelope(&mut op, 0, 10_000);
        assert!(levels.iter().all(|l| *l == 0x1ff));
        assert_eq!(op.envelope_state(), EnvelopeState::Attack);
    }

    #[test]
    fn test_envelope_output_includes_levels() {
        let mut op = Operator::new(0);
        op.write_40(0x0a, PITCH);
        op.tremolo = true;
        op.eg_rout = 0;
        op.eg_state = EnvelopeState::Sustain;
        op.sustained = true;
        op.advance_envelope(1, 3, PITCH.ksv);
        assert_eq!(op.total_attenuation(), (0x0a << 2) + 3);
    }

    #[test]
    fn test_key_scale_level_shift() {
        let pitch = Pitch {
            f_num: 0x3ff,
            block: 7,
            ksv: 15,
        };
        let mut op = Operator::new(0);
        op.eg_rout = 0;
        op.eg_state = EnvelopeState::Sustain;
        op.sustained = true;

        // level 0 ignores the key scale attenuation entirely
        op.write_40(0x05, pitch);
        op.advance_envelope(1, 0, pitch.ksv);
        assert_eq!(op.total_attenuation(), 0x05 << 2);

        op.write_40(0xc5, pitch);
        op.advance_envelope(2, 0, pitch.ksv);
        assert_eq!(op.total_attenuation(), (0x05 << 2) + 224);

        // level 1 is half of level 3
        op.write_40(0x45, pitch);
        op.advance_envelope(3, 0, pitch.ksv);
        assert_eq!(op.total_attenuation(), (0x05 << 2) + 112);
    }

    #[test]
    fn test_release_is_non_decreasing() {
        // release rate 15 steps by 4, so the level lands past 0x1ff unless pinned
        for sustained in [0x20, 0x00] {
            let mut op = Operator::new(0);
            op.write_20(sustained, PITCH.ksv);
            op.write_60(0xf8, PITCH.ksv);
            op.write_80(0x2f, PITCH.ksv);
            op.key_on(KeyKind::Normal, PITCH.ksv);
            let mut levels = run_envelope(&mut op, 0, 2_000);
            if sustained != 0 {
                assert_eq!(op.envelope_state(), EnvelopeState::Sustain);
                op.key_off(KeyKind::Normal, PITCH.ksv);
            }

            let mut timer = 2_000;
            while op.envelope_state() != EnvelopeState::Off && timer < 100_000 {
                op.advance_envelope(timer, 0, PITCH.ksv);
                levels.push(op.attenuation());
                timer += 1;
            }
            assert_eq!(op.envelope_state(), EnvelopeState::Off);
            assert!(
                levels.windows(2).all(|w| w[1] >= w[0]),
                "sustain bit {:#x}",
                sustained
            );
            assert_eq!(levels.last(), Some(&0x1ff));
        }
    }

    #[test]
    fn test_phase_step() {
        let mut op = Operator::new(0);
        op.write_20(0x01, PITCH.ksv);
        op.advance_phase(PITCH, 0, false);
        assert_eq!(op.phase(), 0x1000);
        // multiplier 0 is one half
        let mut half = Operator::new(0);
        half.advance_phase(PITCH, 0, false);
        assert_eq!(half.phase(), 0x800);
    }

    #[test]
    fn test_vibrato_offsets_f_num() {
        let pitch = Pitch {
            f_num: 0x3ff,
            block: 0,
            ksv: 0,
        };
        let mut steady = Operator::new(0);
        steady.write_20(0x01, 0);
        let mut vib = Operator::new(0);
        vib.write_20(0x41, 0);
        // position 0 leaves the pitch alone
        steady.advance_phase(pitch, 0, true);
        vib.advance_phase(pitch, 0, true);
        assert_eq!(steady.phase(), vib.phase());
        // position 2 adds the full range of 7
        vib.phase = 0;
        vib.advance_phase(pitch, 2 << 10, true);
        assert_eq!(vib.phase(), ((0x3ff + 7) >> 1) * 2 >> 1);
        // position 6 subtracts it, halved by the shallow depth
        vib.phase = 0;
        vib.advance_phase(pitch, 6 << 10, false);
        assert_eq!(vib.phase(), ((0x3ff - 3) >> 1) * 2 >> 1);
    }

    #[test]
    fn test_feedback_history() {
        let mut op = Operator::new(0);
        op.out = 1000;
        op.update_feedback(0);
        assert_eq!(op.feedback_modulation(), 0);
        op.out = 2000;
        op.update_feedback(7);
        assert_eq!(op.feedback_modulation(), (2000 + 1000) >> 2);
    }

    #[test]
    fn test_waveform_register_mask() {
        let mut op = Operator::new(0);
        op.write_e0(0x07, false);
        assert_eq!(op.waveform(), Waveform::PulseSine);
        op.write_e0(0x07, true);
        assert_eq!(op.waveform(), Waveform::LogSaw);
    }

    #[test]
    fn test_generate_uses_modulation() {
        let mut op = Operator::new(0);
        op.eg_out = 0;
        op.generate(0x100);
        assert_eq!(op.output(), 4084);
        op.generate(-0x100);
        assert_eq!(op.output(), !4084);
    }
}
