//! # Resampling
//!
//! Linear interpolation from the native 49716 Hz stream to a host rate, in
//! fixed point with 10 fractional bits. Each output sample blends the last
//! two native samples by how far the output clock has moved past the older one.

use log::debug;

use crate::chip::LOG_TAG;
use crate::config::{ConfigError, validate_output_rate};
use crate::{Chip, NATIVE_RATE};

const RSM_FRAC: u32 = 10;

/// Output clock and the two native samples it interpolates between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resampler {
    output_rate: u32,
    /// Native samples per output sample, scaled by `1 << RSM_FRAC`
    ratio: i32,
    /// Output clock position, scaled by `1 << RSM_FRAC`
    count: i32,
    previous: [i16; 2],
    current: [i16; 2],
}

impl Resampler {
    pub fn new(output_rate: u32) -> Self {
        let ratio = (((output_rate as u64) << RSM_FRAC) / NATIVE_RATE as u64).max(1) as i32;
        Self {
            output_rate,
            ratio,
            count: 0,
            previous: [0; 2],
            current: [0; 2],
        }
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn ratio(&self) -> i32 {
        self.ratio
    }

    /// Clears the interpolation history, keeping the rate
    pub fn reset(&mut self) {
        *self = Self::new(self.output_rate);
    }

    fn needs_input(&self) -> bool {
        self.count >= self.ratio
    }

    fn push(&mut self, sample: [i16; 2]) {
        self.previous = self.current;
        self.current = sample;
        self.count -= self.ratio;
    }

    fn interpolate(&self) -> [i16; 2] {
        let blend = |old: i16, new: i16| {
            ((old as i32 * (self.ratio - self.count) + new as i32 * self.count) / self.ratio) as i16
        };
        [
            blend(self.previous[0], self.current[0]),
            blend(self.previous[1], self.current[1]),
        ]
    }

    fn advance(&mut self) {
        self.count += 1 << RSM_FRAC;
    }
}

impl Chip {
    pub fn output_rate(&self) -> u32 {
        self.resampler.output_rate()
    }

    /// Changes the host rate used by `generate_resampled`
    ///
    /// Interpolation restarts from silence.
    pub fn set_output_rate(&mut self, rate: u32) -> Result<(), ConfigError> {
        validate_output_rate(rate)?;
        self.resampler = Resampler::new(rate);
        debug!(
            target: LOG_TAG,
            "Output rate {} Hz, ratio {}/1024", rate, self.resampler.ratio()
        );
        Ok(())
    }

    /// Fills an interleaved stereo buffer at the output rate
    pub fn generate_resampled(&mut self, output: &mut [i16]) {
        for frame in output.chunks_exact_mut(2) {
            while self.resampler.needs_input() {
                let sample = self.generate_sample();
                self.resampler.push(sample);
            }
            let [left, right] = self.resampler.interpolate();
            frame[0] = left;
            frame[1] = right;
            self.resampler.advance();
        }
    }
}
