//! 23-bit noise LFSR feeding the hi-hat, snare and cymbal phase logic.

/// Power-on value of the LFSR
pub const NOISE_SEED: u32 = 0x306600;
const NOISE_TAPS: u32 = 0x800302;

/// The chip's pseudo-random bit source. Clocked once per output sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Noise {
    state: u32,
}

impl Default for Noise {
    fn default() -> Self {
        Self { state: NOISE_SEED }
    }
}

impl Noise {
    /// Advance the register by one sample
    #[inline]
    pub fn step(&mut self) {
        if self.state & 1 != 0 {
            self.state ^= NOISE_TAPS;
        }
        self.state >>= 1;
    }

    /// Current output bit
    #[inline]
    pub fn bit(&self) -> u16 {
        (self.state & 1) as u16
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}
