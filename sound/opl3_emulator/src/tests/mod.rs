//! Whole chip scenarios driven only through register writes.

mod mixing_tests;

use crate::Chip;

/// Register offset of the first operator of channel `ch`
pub(super) fn operator_reg(ch: u16) -> u16 {
    ((ch / 9) << 8) + [0, 1, 2, 8, 9, 10, 16, 17, 18][(ch % 9) as usize]
}

/// Register of a channel group (0xA0, 0xB0, 0xC0) for channel `ch`
pub(super) fn channel_reg(ch: u16, group: u16) -> u16 {
    ((ch / 9) << 8) + group + ch % 9
}

/// Programs a sustained voice with multiplier 1 and an instant attack. The
/// modulator sits at full attenuation so the carrier is close to a pure wave.
pub(super) fn program_voice(chip: &mut Chip, ch: u16, c0: u8, release: u8) {
    let op = operator_reg(ch);
    chip.write_reg(op + 0x20, 0x21);
    chip.write_reg(op + 0x23, 0x21);
    chip.write_reg(op + 0x40, 0x3f);
    chip.write_reg(op + 0x43, 0x00);
    chip.write_reg(op + 0x60, 0xf0);
    chip.write_reg(op + 0x63, 0xf0);
    chip.write_reg(op + 0x80, release & 0x0f);
    chip.write_reg(op + 0x83, release & 0x0f);
    chip.write_reg(channel_reg(ch, 0xc0), c0);
}

pub(super) fn key_on(chip: &mut Chip, ch: u16, f_num: u16, block: u8) {
    chip.write_reg(channel_reg(ch, 0xa0), (f_num & 0xff) as u8);
    chip.write_reg(
        channel_reg(ch, 0xb0),
        0x20 | (block << 2) | ((f_num >> 8) & 0x03) as u8,
    );
}

pub(super) fn key_off(chip: &mut Chip, ch: u16, f_num: u16, block: u8) {
    chip.write_reg(
        channel_reg(ch, 0xb0),
        (block << 2) | ((f_num >> 8) & 0x03) as u8,
    );
}

/// Renders `frames` stereo frames
pub(super) fn render(chip: &mut Chip, frames: usize) -> Vec<i16> {
    let mut out = vec![0i16; frames * 2];
    chip.generate(&mut out);
    out
}

pub(super) fn left(samples: &[i16]) -> Vec<i16> {
    samples.iter().step_by(2).copied().collect()
}
