//! # Channel Implementation
//!
//! Pitch, feedback and algorithm routing of a channel. Wiring a channel
//! touches its operators and, in 4-operator mode, its partner channel, so
//! most of the work here is done on the `Chip` that owns all of them.

use log::trace;

use crate::chip::LOG_TAG;
use crate::tables::CHANNEL_OPERATOR;
use crate::*;

impl Channel {
    /// Creates channel `index` wired to its two operators and its 4-op partner
    pub fn new(index: usize) -> Self {
        let first = CHANNEL_OPERATOR[index];
        let pair = match index % 9 {
            0..=2 => Some(index + 3),
            3..=5 => Some(index - 3),
            _ => None,
        };
        Self {
            operators: [first, first + 3],
            pair,
            ..Default::default()
        }
    }

    pub fn operators(&self) -> [usize; 2] {
        self.operators
    }

    pub fn pair(&self) -> Option<usize> {
        self.pair
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn f_num(&self) -> u16 {
        self.pitch.f_num
    }

    pub fn block(&self) -> u8 {
        self.pitch.block
    }

    pub fn feedback(&self) -> u8 {
        self.feedback
    }

    pub fn algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn taps(&self) -> [Option<usize>; 4] {
        self.taps
    }

    /// Left and right enables from register 0xC0
    pub fn output_enabled(&self) -> (bool, bool) {
        (self.mask_left != 0, self.mask_right != 0)
    }

    /// Continuous left and right gains
    pub fn panning(&self) -> (f32, f32) {
        (self.gain_left, self.gain_right)
    }

    pub(crate) fn set_panning(&mut self, left: f32, right: f32) {
        self.gain_left = left;
        self.gain_right = right;
    }

    /// Stores a new f_num and block, recomputing the key scale value
    fn set_pitch(&mut self, f_num: u16, block: u8, note_select: u8) {
        self.pitch = Pitch {
            f_num,
            block,
            ksv: (block << 1) | ((f_num >> (9 - note_select)) & 0x01) as u8,
        };
    }

    /// Sum of the output taps, wrapping like the 16-bit accumulator it models
    pub(crate) fn accumulate(&self, operators: &[Operator; OPERATOR_COUNT]) -> i16 {
        self.taps
            .iter()
            .flatten()
            .fold(0i16, |acc, &op| acc.wrapping_add(operators[op].out))
    }

    /// Contribution of this channel to one side of the mix
    ///
    /// # Arguments
    /// * `accm` - The channel's summed taps
    /// * `right` - Which side is being mixed
    /// * `full_pan` - Apply the continuous gain on top of the enable bit
    pub(crate) fn route(&self, accm: i16, right: bool, full_pan: bool) -> i16 {
        let (mask, gain) = if right {
            (self.mask_right, self.gain_right)
        } else {
            (self.mask_left, self.gain_left)
        };
        let masked = accm & mask;
        if full_pan {
            (masked as f32 * gain) as i16
        } else {
            masked
        }
    }
}

impl Chip {
    /// Recomputes ksl and rate of a channel's operators after a pitch change
    fn refresh_operators(&mut self, ch: usize) {
        let pitch = self.channels[ch].pitch;
        for op in self.channels[ch].operators {
            self.operators[op].update_ksl(pitch);
            self.operators[op].update_rate(pitch.ksv);
        }
    }

    /// Copies the primary's pitch into its 4-op partner
    fn mirror_pitch(&mut self, ch: usize) {
        if self.new_mode && self.channels[ch].channel_type == ChannelType::FourOperatorPrimary {
            if let Some(pair) = self.channels[ch].pair {
                self.channels[pair].pitch = self.channels[ch].pitch;
                self.refresh_operators(pair);
            }
        }
    }

    fn is_four_op_secondary(&self, ch: usize) -> bool {
        self.new_mode && self.channels[ch].channel_type == ChannelType::FourOperatorSecondary
    }

    /// Register 0xA0: f_num low byte
    pub(crate) fn write_a0(&mut self, ch: usize, val: u8) {
        if self.is_four_op_secondary(ch) {
            return;
        }
        let pitch = self.channels[ch].pitch;
        let f_num = (pitch.f_num & 0x300) | val as u16;
        self.channels[ch].set_pitch(f_num, pitch.block, self.note_select);
        self.refresh_operators(ch);
        self.mirror_pitch(ch);
    }

    /// Register 0xB0: f_num high bits and block. Key on is handled by the caller.
    pub(crate) fn write_b0(&mut self, ch: usize, val: u8) {
        if self.is_four_op_secondary(ch) {
            return;
        }
        let pitch = self.channels[ch].pitch;
        let f_num = (pitch.f_num & 0xff) | (((val & 0x03) as u16) << 8);
        let block = (val >> 2) & 0x07;
        self.channels[ch].set_pitch(f_num, block, self.note_select);
        self.refresh_operators(ch);
        self.mirror_pitch(ch);
    }

    /// Register 0xC0: output enables, feedback, connection
    pub(crate) fn write_c0(&mut self, ch: usize, val: u8) {
        let channel = &mut self.channels[ch];
        channel.feedback = (val & 0x0e) >> 1;
        channel.connection = val & 0x01;
        self.update_algorithm(ch);
        let channel = &mut self.channels[ch];
        if self.new_mode {
            channel.mask_left = if val & 0x10 != 0 { -1 } else { 0 };
            channel.mask_right = if val & 0x20 != 0 { -1 } else { 0 };
        } else {
            channel.mask_left = -1;
            channel.mask_right = -1;
        }
    }

    /// Derives the algorithm code from the connection bits and re-wires
    ///
    /// For a 4-op pair the code lives on the secondary channel, which also
    /// carries the pair's output taps.
    pub(crate) fn update_algorithm(&mut self, ch: usize) {
        let connection = self.channels[ch].connection;
        self.channels[ch].algorithm = connection;
        if !self.new_mode {
            self.setup_algorithm(ch);
            return;
        }
        match (self.channels[ch].channel_type, self.channels[ch].pair) {
            (ChannelType::FourOperatorPrimary, Some(pair)) => {
                self.channels[pair].algorithm =
                    0x04 | (connection << 1) | self.channels[pair].connection;
                self.channels[ch].algorithm = 0x08;
                self.setup_algorithm(pair);
            }
            (ChannelType::FourOperatorSecondary, Some(pair)) => {
                self.channels[ch].algorithm =
                    0x04 | (self.channels[pair].connection << 1) | connection;
                self.channels[pair].algorithm = 0x08;
                self.setup_algorithm(ch);
            }
            _ => self.setup_algorithm(ch),
        }
    }

    /// Wires modulation inputs and output taps for the channel's algorithm
    pub(crate) fn setup_algorithm(&mut self, ch: usize) {
        let [s0, s1] = self.channels[ch].operators;
        let algorithm = self.channels[ch].algorithm;

        if self.channels[ch].channel_type == ChannelType::Rhythm {
            self.operators[s0].set_modulation(Modulation::Feedback);
            self.operators[s1].set_modulation(if algorithm & 0x01 == 0 {
                Modulation::Operator(s0)
            } else {
                Modulation::Zero
            });
            return;
        }
        if algorithm & 0x08 != 0 {
            return;
        }

        if algorithm & 0x04 != 0 {
            let Some(pair) = self.channels[ch].pair else {
                return;
            };
            let [p0, p1] = self.channels[pair].operators;
            self.channels[pair].taps = [None; 4];
            self.operators[p0].set_modulation(Modulation::Feedback);
            let (p1_mod, s0_mod, s1_mod, taps) = match algorithm & 0x03 {
                0x00 => (
                    Modulation::Operator(p0),
                    Modulation::Operator(p1),
                    Modulation::Operator(s0),
                    [Some(s1), None, None, None],
                ),
                0x01 => (
                    Modulation::Operator(p0),
                    Modulation::Zero,
                    Modulation::Operator(s0),
                    [Some(p1), Some(s1), None, None],
                ),
                0x02 => (
                    Modulation::Zero,
                    Modulation::Operator(p1),
                    Modulation::Operator(s0),
                    [Some(p0), Some(s1), None, None],
                ),
                _ => (
                    Modulation::Zero,
                    Modulation::Operator(p1),
                    Modulation::Zero,
                    [Some(p0), Some(s0), Some(s1), None],
                ),
            };
            self.operators[p1].set_modulation(p1_mod);
            self.operators[s0].set_modulation(s0_mod);
            self.operators[s1].set_modulation(s1_mod);
            self.channels[ch].taps = taps;
        } else {
            self.operators[s0].set_modulation(Modulation::Feedback);
            if algorithm & 0x01 == 0 {
                self.operators[s1].set_modulation(Modulation::Operator(s0));
                self.channels[ch].taps = [Some(s1), None, None, None];
            } else {
                self.operators[s1].set_modulation(Modulation::Zero);
                self.channels[ch].taps = [Some(s0), Some(s1), None, None];
            }
        }
    }

    /// Operators keyed by a channel-level key event
    fn keyed_operators(&self, ch: usize) -> ([usize; 4], usize) {
        let channel = &self.channels[ch];
        let [s0, s1] = channel.operators;
        if !self.new_mode {
            return ([s0, s1, 0, 0], 2);
        }
        match (channel.channel_type, channel.pair) {
            (ChannelType::FourOperatorPrimary, Some(pair)) => {
                let [p0, p1] = self.channels[pair].operators;
                ([s0, s1, p0, p1], 4)
            }
            (ChannelType::TwoOperator | ChannelType::Rhythm, _) => ([s0, s1, 0, 0], 2),
            _ => ([0; 4], 0),
        }
    }

    /// Normal key on for every operator the channel drives
    pub(crate) fn key_on_channel(&mut self, ch: usize) {
        let (ops, count) = self.keyed_operators(ch);
        for &op in &ops[..count] {
            let ksv = self.channels[self.operators[op].channel].pitch.ksv;
            self.operators[op].key_on(KeyKind::Normal, ksv);
        }
    }

    /// Normal key off for every operator the channel drives
    pub(crate) fn key_off_channel(&mut self, ch: usize) {
        let (ops, count) = self.keyed_operators(ch);
        for &op in &ops[..count] {
            let ksv = self.channels[self.operators[op].channel].pitch.ksv;
            self.operators[op].key_off(KeyKind::Normal, ksv);
        }
    }

    /// Register 0x104: enables 4-operator mode per channel pair
    ///
    /// Bits 0-2 pair channels 0-2 with 3-5, bits 3-5 pair 9-11 with 12-14.
    /// Both sides are re-wired so the taps never point at a stale topology.
    pub(crate) fn set_four_op(&mut self, val: u8) {
        let val = val & 0x3f;
        if val != self.four_op {
            trace!(target: LOG_TAG, "4-op pairs {:06b} -> {:06b}", self.four_op, val);
        }
        self.four_op = val;
        for bit in 0..6 {
            let ch = if bit < 3 { bit } else { bit + 6 };
            if (val >> bit) & 0x01 != 0 {
                self.channels[ch].channel_type = ChannelType::FourOperatorPrimary;
                self.channels[ch + 3].channel_type = ChannelType::FourOperatorSecondary;
                self.update_algorithm(ch);
            } else {
                self.channels[ch].channel_type = ChannelType::TwoOperator;
                self.channels[ch + 3].channel_type = ChannelType::TwoOperator;
                self.update_algorithm(ch);
                self.update_algorithm(ch + 3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_wiring() {
        let ch = Channel::new(4);
        assert_eq!(ch.operators(), [7, 10]);
        assert_eq!(ch.pair(), Some(1));
        assert_eq!(Channel::new(9).operators(), [18, 21]);
        assert_eq!(Channel::new(11).pair(), Some(14));
        assert_eq!(Channel::new(7).pair(), None);
        assert_eq!(Channel::new(17).pair(), None);
    }

    #[test]
    fn test_key_scale_value() {
        let mut ch = Channel::new(0);
        ch.set_pitch(0x200, 5, 0);
        assert_eq!(ch.pitch().ksv, 11);
        ch.set_pitch(0x100, 5, 0);
        assert_eq!(ch.pitch().ksv, 10);
        // note select moves the split to bit 8
        ch.set_pitch(0x100, 5, 1);
        assert_eq!(ch.pitch().ksv, 11);
    }

    #[test]
    fn test_two_op_algorithms() {
        let mut chip = Chip::new(false);
        chip.write_c0(0, 0x00);
        assert_eq!(chip.operators[0].modulation(), Modulation::Feedback);
        assert_eq!(chip.operators[3].modulation(), Modulation::Operator(0));
        assert_eq!(chip.channels[0].taps(), [Some(3), None, None, None]);

        chip.write_c0(0, 0x01);
        assert_eq!(chip.operators[3].modulation(), Modulation::Zero);
        assert_eq!(chip.channels[0].taps(), [Some(0), Some(3), None, None]);
    }

    #[test]
    fn test_four_op_chain() {
        let mut chip = Chip::new(false);
        chip.write_reg(0x105, 0x01);
        chip.write_reg(0x104, 0x01);
        chip.write_reg(0xc0, 0x00);
        chip.write_reg(0xc3, 0x00);
        assert_eq!(chip.channels[0].algorithm(), 0x08);
        assert_eq!(chip.channels[3].algorithm(), 0x04);
        assert_eq!(chip.operators[0].modulation(), Modulation::Feedback);
        assert_eq!(chip.operators[3].modulation(), Modulation::Operator(0));
        assert_eq!(chip.operators[6].modulation(), Modulation::Operator(3));
        assert_eq!(chip.operators[9].modulation(), Modulation::Operator(6));
        assert_eq!(chip.channels[0].taps(), [None; 4]);
        assert_eq!(chip.channels[3].taps(), [Some(9), None, None, None]);
    }

    #[test]
    fn test_four_op_topologies() {
        let mut chip = Chip::new(false);
        chip.write_reg(0x105, 0x01);
        chip.write_reg(0x104, 0x01);

        chip.write_reg(0xc0, 0x00);
        chip.write_reg(0xc3, 0x01);
        assert_eq!(chip.operators[6].modulation(), Modulation::Zero);
        assert_eq!(chip.channels[3].taps(), [Some(3), Some(9), None, None]);

        chip.write_reg(0xc0, 0x01);
        chip.write_reg(0xc3, 0x00);
        assert_eq!(chip.operators[3].modulation(), Modulation::Zero);
        assert_eq!(chip.operators[6].modulation(), Modulation::Operator(3));
        assert_eq!(chip.channels[3].taps(), [Some(0), Some(9), None, None]);

        chip.write_reg(0xc3, 0x01);
        assert_eq!(chip.operators[9].modulation(), Modulation::Zero);
        assert_eq!(chip.channels[3].taps(), [Some(0), Some(6), Some(9), None]);
    }

    #[test]
    fn test_disabling_four_op_restores_pairs() {
        let mut chip = Chip::new(false);
        chip.write_reg(0x105, 0x01);
        chip.write_reg(0x104, 0x01);
        chip.write_reg(0xc0, 0x00);
        chip.write_reg(0x104, 0x00);
        assert_eq!(chip.channels[0].channel_type(), ChannelType::TwoOperator);
        assert_eq!(chip.channels[0].taps(), [Some(3), None, None, None]);
        assert_eq!(chip.channels[3].taps(), [Some(9), None, None, None]);
        assert_eq!(chip.operators[6].modulation(), Modulation::Feedback);
    }

    #[test]
    fn test_four_op_pitch_mirrors_to_pair() {
        let mut chip = Chip::new(false);
        chip.write_reg(0x105, 0x01);
        chip.write_reg(0x104, 0x02);
        chip.write_reg(0xa1, 0x44);
        chip.write_reg(0xb1, 0x0d);
        assert_eq!(chip.channels[4].f_num(), 0x144);
        assert_eq!(chip.channels[4].block(), 3);
        // the secondary ignores its own pitch registers
        chip.write_reg(0xa4, 0x99);
        assert_eq!(chip.channels[4].f_num(), 0x144);
    }

    #[test]
    fn test_four_op_key_on_drives_pair() {
        let mut chip = Chip::new(false);
        chip.write_reg(0x105, 0x01);
        chip.write_reg(0x104, 0x01);
        chip.write_reg(0xb0, 0x20);
        for op in [0, 3, 6, 9] {
            assert!(chip.operators[op].is_keyed());
        }
        chip.write_reg(0xb3, 0x00);
        assert!(chip.operators[6].is_keyed());
        chip.write_reg(0xb0, 0x00);
        for op in [0, 3, 6, 9] {
            assert_eq!(chip.operators[op].envelope_state(), EnvelopeState::Release);
        }
    }

    #[test]
    fn test_output_enables_need_new_mode() {
        let mut chip = Chip::new(false);
        chip.write_c0(2, 0x00);
        assert_eq!(chip.channels[2].output_enabled(), (true, true));
        chip.write_reg(0x105, 0x01);
        chip.write_c0(2, 0x10);
        assert_eq!(chip.channels[2].output_enabled(), (true, false));
        chip.write_c0(2, 0x20);
        assert_eq!(chip.channels[2].output_enabled(), (false, true));
    }

    #[test]
    fn test_route_with_gain() {
        let mut ch = Channel::new(0);
        assert_eq!(ch.route(-100, false, false), -100);
        ch.set_panning(0.5, 0.25);
        assert_eq!(ch.route(-100, false, true), -50);
        assert_eq!(ch.route(-100, true, true), -25);
        ch.mask_right = 0;
        assert_eq!(ch.route(-100, true, true), 0);
    }
}
