//! # Waveform Generation
//!
//! The eight operator waveforms. Each one reshapes a 10-bit phase onto the
//! quarter-wave log-sine ROM, adds the envelope attenuation in the log domain
//! and converts back with the exponent ROM. Negative half-waves are the bitwise
//! complement of the positive value, which is how the chip's DAC input works.

use crate::tables::{LOG_SIN_ROM, calc_exp};

/// Log-domain level that `calc_exp` turns into silence
const LEVEL_SILENT: u32 = 0x1000;

/// Operator waveform, selected with register `0xE0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    HalfSine,
    AbsSine,
    /// Rising quarter of the absolute sine, silent for the other quarter
    PulseSine,
    /// Double speed sine in the first half period only
    AlternatingSine,
    /// Double speed absolute sine in the first half period only
    CamelSine,
    Square,
    /// Exponential ramp usually called the derived square or log saw
    LogSaw,
}

impl Waveform {
    /// Decodes the three waveform select bits
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Waveform::Sine,
            1 => Waveform::HalfSine,
            2 => Waveform::AbsSine,
            3 => Waveform::PulseSine,
            4 => Waveform::AlternatingSine,
            5 => Waveform::CamelSine,
            6 => Waveform::Square,
            _ => Waveform::LogSaw,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Computes one operator output sample
    ///
    /// # Arguments
    /// * `phase` - Operator phase plus modulation, only the low 10 bits are used
    /// * `envelope` - Total attenuation from the envelope generator (`eg_out`)
    ///
    /// # Returns
    /// The signed 13-bit operator output
    pub fn sample(self, phase: u16, envelope: u16) -> i16 {
        let mut phase = phase & 0x3ff;
        let mut negative = false;
        let level = match self {
            Waveform::Sine => {
                negative = phase & 0x200 != 0;
                quarter_sine(phase)
            }
            Waveform::HalfSine => {
                if phase & 0x200 != 0 {
                    LEVEL_SILENT
                } else {
                    quarter_sine(phase)
                }
            }
            Waveform::AbsSine => quarter_sine(phase),
            Waveform::PulseSine => {
                if phase & 0x100 != 0 {
                    LEVEL_SILENT
                } else {
                    LOG_SIN_ROM[(phase & 0xff) as usize] as u32
                }
            }
            Waveform::AlternatingSine => {
                negative = phase & 0x300 == 0x100;
                double_speed_sine(phase)
            }
            Waveform::CamelSine => double_speed_sine(phase),
            Waveform::Square => {
                negative = phase & 0x200 != 0;
                0
            }
            Waveform::LogSaw => {
                if phase & 0x200 != 0 {
                    negative = true;
                    phase = (phase & 0x1ff) ^ 0x1ff;
                }
                (phase as u32) << 3
            }
        };
        let out = calc_exp(level + ((envelope as u32) << 3));
        if negative { !out } else { out }
    }
}

/// Mirrors the log-sine quarter across a half period
#[inline]
fn quarter_sine(phase: u16) -> u32 {
    if phase & 0x100 != 0 {
        LOG_SIN_ROM[((phase & 0xff) ^ 0xff) as usize] as u32
    } else {
        LOG_SIN_ROM[(phase & 0xff) as usize] as u32
    }
}

/// Full sine squeezed into the first half period, silent in the second
#[inline]
fn double_speed_sine(phase: u16) -> u32 {
    if phase & 0x200 != 0 {
        LEVEL_SILENT
    } else if phase & 0x80 != 0 {
        LOG_SIN_ROM[(((phase ^ 0xff) << 1) & 0xff) as usize] as u32
    } else {
        LOG_SIN_ROM[((phase << 1) & 0xff) as usize] as u32
    }
}
