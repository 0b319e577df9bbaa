//! # Chip Implementation
//!
//! Register decoding and the per-sample pipeline. Every call to
//! `generate_sample` clocks all 36 operators once, in the same slot order as
//! the hardware, and mixes the channels into a stereo pair.

use log::{debug, trace};
use sound_traits::OplEmulator;

use crate::config::{ConfigError, OplConfig};
use crate::tables::{CHANNEL_OPERATOR, OPERATOR_OFFSET, PAN_LAW};
use crate::*;

pub(crate) const LOG_TAG: &str = "OPL3";

#[inline]
fn clip_sample(sample: i32) -> i16 {
    sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

impl Chip {
    /// Creates a chip in its power-on state
    ///
    /// # Arguments
    /// * `full_pan` - Mix channels with continuous gains (see `set_panning`)
    ///   instead of the on/off routing bits of register 0xC0
    pub fn new(full_pan: bool) -> Self {
        let mut chip = Self {
            operators: std::array::from_fn(|_| Operator::default()),
            channels: std::array::from_fn(Channel::new),
            noise: Noise::default(),
            timer: 0,
            new_mode: false,
            note_select: 0,
            four_op: 0,
            rhythm: 0,
            tremolo_depth: false,
            vibrato_depth: false,
            tremolo_step: 0,
            tremolo_falling: false,
            tremolo_value: 0,
            mix: [0; 2],
            full_pan,
            resampler: Resampler::new(NATIVE_RATE),
        };
        chip.reset();
        chip
    }

    /// Creates a chip from a host configuration
    pub fn with_config(config: &OplConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut chip = Self::new(config.full_pan);
        chip.set_output_rate(config.output_rate)?;
        debug!(
            target: LOG_TAG,
            "Configured: full pan {}, output rate {} Hz", config.full_pan, config.output_rate
        );
        Ok(chip)
    }

    /// Returns the chip to its power-on state
    ///
    /// The panning mode and the output rate are host settings and survive;
    /// channel gains go back to 1.0.
    pub fn reset(&mut self) {
        for (ch, &first) in CHANNEL_OPERATOR.iter().enumerate() {
            self.operators[first] = Operator::new(ch);
            self.operators[first + 3] = Operator::new(ch);
        }
        self.channels = std::array::from_fn(Channel::new);
        self.noise = Noise::default();
        self.timer = 0;
        self.new_mode = false;
        self.note_select = 0;
        self.four_op = 0;
        self.rhythm = 0;
        self.tremolo_depth = false;
        self.vibrato_depth = false;
        self.tremolo_step = 0;
        self.tremolo_falling = false;
        self.tremolo_value = 0;
        self.mix = [0; 2];
        self.resampler.reset();
        for ch in 0..CHANNEL_COUNT {
            self.setup_algorithm(ch);
        }
        debug!(target: LOG_TAG, "Reset, full pan {}", self.full_pan);
    }

    fn set_new_mode(&mut self, enabled: bool) {
        if self.new_mode != enabled {
            trace!(target: LOG_TAG, "OPL3 mode {}", if enabled { "on" } else { "off" });
        }
        self.new_mode = enabled;
    }

    /// Operator addressed by the low five bits of an operator register
    fn operator_index(high: usize, regm: u8) -> Option<usize> {
        OPERATOR_OFFSET[(regm & 0x1f) as usize].map(|offset| 18 * high + offset)
    }

    /// Channel addressed by the low nibble of a channel register
    fn channel_index(high: usize, regm: u8) -> Option<usize> {
        let ch = (regm & 0x0f) as usize;
        (ch < 9).then_some(9 * high + ch)
    }

    /// Pitch of the channel owning operator `op`
    fn operator_pitch(&self, op: usize) -> Pitch {
        self.channels[self.operators[op].channel].pitch
    }

    /// Writes a value to a chip register
    ///
    /// Bit 8 of `reg` selects the second register bank. Writes take effect
    /// immediately; unused and reserved addresses are ignored.
    ///
    /// # Arguments
    /// * `reg` - The register address, only the low 9 bits are decoded
    /// * `val` - The value to write
    pub fn write_reg(&mut self, reg: u16, val: u8) {
        let high = ((reg >> 8) & 0x01) as usize;
        let regm = (reg & 0xff) as u8;

        match regm & 0xf0 {
            0x00 => {
                if high == 1 {
                    match regm & 0x0f {
                        0x04 => self.set_four_op(val),
                        0x05 => self.set_new_mode(val & 0x01 != 0),
                        _ => {}
                    }
                } else if regm & 0x0f == 0x08 {
                    self.note_select = (val >> 6) & 0x01;
                }
            }
            0x20 | 0x30 => {
                if let Some(op) = Self::operator_index(high, regm) {
                    let ksv = self.operator_pitch(op).ksv;
                    self.operators[op].write_20(val, ksv);
                }
            }
            0x40 | 0x50 => {
                if let Some(op) = Self::operator_index(high, regm) {
                    let pitch = self.operator_pitch(op);
                    self.operators[op].write_40(val, pitch);
                }
            }
            0x60 | 0x70 => {
                if let Some(op) = Self::operator_index(high, regm) {
                    let ksv = self.operator_pitch(op).ksv;
                    self.operators[op].write_60(val, ksv);
                }
            }
            0x80 | 0x90 => {
                if let Some(op) = Self::operator_index(high, regm) {
                    let ksv = self.operator_pitch(op).ksv;
                    self.operators[op].write_80(val, ksv);
                }
            }
            0xe0 | 0xf0 => {
                if let Some(op) = Self::operator_index(high, regm) {
                    self.operators[op].write_e0(val, self.new_mode);
                }
            }
            0xa0 => {
                if let Some(ch) = Self::channel_index(high, regm) {
                    self.write_a0(ch, val);
                }
            }
            0xb0 => {
                if regm == 0xbd && high == 0 {
                    self.write_bd(val);
                } else if let Some(ch) = Self::channel_index(high, regm) {
                    self.write_b0(ch, val);
                    if val & 0x20 != 0 {
                        self.key_on_channel(ch);
                    } else {
                        self.key_off_channel(ch);
                    }
                }
            }
            0xc0 => {
                if let Some(ch) = Self::channel_index(high, regm) {
                    self.write_c0(ch, val);
                }
            }
            _ => {}
        }
    }

    /// Feedback, phase and envelope of one operator
    fn clock_operator(&mut self, op: usize) {
        let channel = &self.channels[self.operators[op].channel];
        let (pitch, feedback) = (channel.pitch, channel.feedback);
        let operator = &mut self.operators[op];
        operator.update_feedback(feedback);
        operator.advance_phase(pitch, self.timer, self.vibrato_depth);
        operator.advance_envelope(self.timer, self.tremolo_value, pitch.ksv);
    }

    /// Output of one operator from its current modulation source
    pub(crate) fn generate_operator(&mut self, op: usize) {
        let modulation = match self.operators[op].modulation {
            Modulation::Zero => 0,
            Modulation::Feedback => self.operators[op].fb_mod,
            Modulation::Operator(source) => self.operators[source].out,
        };
        self.operators[op].generate(modulation);
    }

    fn update_operators(&mut self, slots: std::ops::Range<usize>) {
        for op in slots {
            self.clock_operator(op);
            self.generate_operator(op);
        }
    }

    /// One side of the mix over all channels
    fn mix_side(&self, right: bool) -> i32 {
        self.channels
            .iter()
            .map(|channel| {
                let accm = channel.accumulate(&self.operators);
                channel.route(accm, right, self.full_pan) as i32
            })
            .sum()
    }

    /// Moves the tremolo triangle one unit every 64 samples
    fn step_tremolo(&mut self) {
        if self.timer & 0x3f != 0x3f {
            return;
        }
        if self.tremolo_falling {
            if self.tremolo_step == 0 {
                self.tremolo_falling = false;
                self.tremolo_step += 1;
            } else {
                self.tremolo_step -= 1;
            }
        } else if self.tremolo_step >= TREMOLO_STEPS {
            self.tremolo_falling = true;
            self.tremolo_step -= 1;
        } else {
            self.tremolo_step += 1;
        }
        let shift = if self.tremolo_depth { 0 } else { 2 };
        self.tremolo_value = (self.tremolo_step >> 2) >> shift;
    }

    /// Generates one stereo sample at the native rate
    ///
    /// The right sample is the mix of the previous call, as on the real chip.
    ///
    /// # Returns
    /// `[left, right]`
    pub fn generate_sample(&mut self) -> [i16; 2] {
        let right = clip_sample(self.mix[1]);

        self.update_operators(0..12);
        for op in 12..15 {
            self.clock_operator(op);
        }
        if self.rhythm_enabled() {
            self.generate_rhythm_low();
        } else {
            for op in 12..15 {
                self.generate_operator(op);
            }
        }
        self.mix[0] = self.mix_side(false);

        for op in 15..18 {
            self.clock_operator(op);
        }
        if self.rhythm_enabled() {
            self.generate_rhythm_high();
        } else {
            for op in 15..18 {
                self.generate_operator(op);
            }
        }
        let left = clip_sample(self.mix[0]);

        self.update_operators(18..33);
        self.mix[1] = self.mix_side(true);
        self.update_operators(33..36);

        self.noise.step();
        self.step_tremolo();
        self.timer += 1;

        [left, right]
    }

    /// Fills an interleaved stereo buffer at the native rate
    ///
    /// A trailing odd sample is left untouched.
    pub fn generate(&mut self, output: &mut [i16]) {
        for frame in output.chunks_exact_mut(2) {
            let [left, right] = self.generate_sample();
            frame[0] = left;
            frame[1] = right;
        }
    }

    /// Fills separate left and right buffers, up to the shorter length
    pub fn generate_planar(&mut self, left: &mut [i16], right: &mut [i16]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            [*l, *r] = self.generate_sample();
        }
    }

    /// Mixes native rate output into an interleaved float buffer
    ///
    /// Samples are scaled by 1/10240 and added to what the buffer already
    /// holds, so several sources can share one buffer.
    pub fn update_f32(&mut self, output: &mut [f32]) {
        for frame in output.chunks_exact_mut(2) {
            let [left, right] = self.generate_sample();
            frame[0] += (left as f64 / FLOAT_SCALE) as f32;
            frame[1] += (right as f64 / FLOAT_SCALE) as f32;
        }
    }

    /// Sets the continuous gains of a channel
    ///
    /// Only has an effect on a chip created with full panning. Out of range
    /// channels are ignored.
    pub fn set_panning(&mut self, channel: usize, left: f32, right: f32) {
        if !self.full_pan {
            return;
        }
        if let Some(channel) = self.channels.get_mut(channel) {
            channel.set_panning(left, right);
        }
    }

    /// Places a channel with a MIDI style pan value, 0 hard left, 64 centre,
    /// 127 hard right
    pub fn set_pan_position(&mut self, channel: usize, pan: u8) {
        let pan = (pan & 0x7f) as usize;
        let left = PAN_LAW[pan] as f32 / 65535.0;
        let right = PAN_LAW[127 - pan] as f32 / 65535.0;
        self.set_panning(channel, left, right);
    }

    pub fn panning(&self, channel: usize) -> Option<(f32, f32)> {
        self.channels.get(channel).map(Channel::panning)
    }

    pub fn operator(&self, index: usize) -> Option<&Operator> {
        self.operators.get(index)
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn full_pan(&self) -> bool {
        self.full_pan
    }

    pub fn new_mode(&self) -> bool {
        self.new_mode
    }

    /// Attenuation the tremolo LFO currently adds
    pub fn tremolo_value(&self) -> u8 {
        self.tremolo_value
    }

    pub fn noise_bit(&self) -> u16 {
        self.noise.bit()
    }

    /// Native samples generated since the last reset
    pub fn sample_counter(&self) -> u64 {
        self.timer
    }
}

impl OplEmulator for Chip {
    fn reset(&mut self) {
        Chip::reset(self);
    }

    fn write_reg(&mut self, reg: u16, val: u8) {
        Chip::write_reg(self, reg, val);
    }

    fn generate(&mut self, output: &mut [i16]) {
        Chip::generate(self, output);
    }

    fn update(&mut self, output: &mut [f32]) {
        self.update_f32(output);
    }

    fn set_panning(&mut self, channel: usize, left: f32, right: f32) {
        Chip::set_panning(self, channel, left, right);
    }
}
