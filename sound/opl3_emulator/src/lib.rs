//! # OPL3 Emulator
//!
//! A sample-exact emulation of the Yamaha YMF262 (OPL3) FM synthesis chip.
//! Given the same sequence of register writes it produces the same stereo
//! stream as the hardware, sample for sample, at the chip's native rate of
//! 49716 Hz.
//!
//! ## Features
//!
//! - 18 channels, 36 operators, 2 and 4 operator algorithms
//! - OPL2 compatibility mode (4 waveforms, fixed stereo routing)
//! - Rhythm mode with the hardware's cross-coupled hi-hat, snare and cymbal phases
//! - Tremolo and vibrato LFOs, 23-bit noise generator
//! - Integer-only core: output is identical on every platform
//! - Optional continuous panning and a linear interpolating resampler for hosts
//!   that can't run at the native rate
//!
//! ## Architecture
//!
//! - **Chip**: owns every operator and channel, decodes register writes and
//!   runs the per-sample pipeline
//! - **Channel**: pitch, feedback, algorithm wiring and output routing
//! - **Operator**: envelope generator, phase generator and waveform output
//!
//! Operators and channels live in fixed arrays on the chip. All links between
//! them (modulation sources, output taps, 4-op pairs) are indices into those
//! arrays, so re-wiring a channel never leaves a stale reference behind.
//!
//! ## Usage
//!
//! ```rust
//! use opl3_emulator::Chip;
//!
//! let mut chip = Chip::new(false);
//! chip.write_reg(0x20, 0x21); // modulator: sustained, multiplier 1
//! chip.write_reg(0x23, 0x21); // carrier: sustained, multiplier 1
//! chip.write_reg(0x40, 0x3f); // modulator fully attenuated
//! chip.write_reg(0x43, 0x00); // carrier at full volume
//! chip.write_reg(0x60, 0xf0); // instant attack
//! chip.write_reg(0x63, 0xf0);
//! chip.write_reg(0xa0, 0x41); // f_num low byte
//! chip.write_reg(0xb0, 0x32); // block 4, key on
//!
//! let mut output = vec![0i16; 1024 * 2];
//! chip.generate(&mut output);
//! assert!(output.iter().any(|s| *s != 0));
//! ```
//!
//! ## Register Reference
//!
//! Bit 8 of the address selects the second bank (channels 9-17, operators 18-35).
//!
//! - `0x104`: 4-operator enable, one bit per channel pair
//! - `0x105`: OPL3 mode enable
//! - `0x08`: note select (key scale rate split point)
//! - `0x20-0x35`: tremolo, vibrato, sustain, KSR, multiplier
//! - `0x40-0x55`: key scale level, total level
//! - `0x60-0x75`: attack rate, decay rate
//! - `0x80-0x95`: sustain level, release rate
//! - `0xA0-0xA8`: f_num low byte
//! - `0xB0-0xB8`: f_num high bits, block, key on
//! - `0xBD`: tremolo depth, vibrato depth, rhythm mode and drum keys
//! - `0xC0-0xC8`: output routing, feedback, connection
//! - `0xE0-0xF5`: waveform select

pub mod channel;
pub mod chip;
pub mod config;
pub mod noise;
pub mod operator;
pub mod resample;
pub mod rhythm;
pub mod tables;
pub mod waveform;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, OplConfig};
pub use noise::Noise;
pub use resample::Resampler;
pub use waveform::Waveform;

/// Native output rate of the chip, 14.31818 MHz / 288
pub const NATIVE_RATE: u32 = 49716;
pub const OPERATOR_COUNT: usize = 36;
pub const CHANNEL_COUNT: usize = 18;

/// Envelope attenuation of a silent operator
const ENV_SILENT: i16 = 0x1ff;
/// Highest combined envelope rate
const RATE_MAX: u8 = 0x3c;
/// Scale used when mixing into float buffers
const FLOAT_SCALE: f64 = 10240.0;
/// Highest tremolo LFO step before it turns around
const TREMOLO_STEPS: u8 = 105;

/// Envelope generator phase of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeState {
    /// Silent, attenuation pinned at maximum
    #[default]
    Off,
    /// Attenuation falling towards zero on an exponential curve
    Attack,
    /// Attenuation rising linearly to the sustain level
    Decay,
    /// Holding the sustain level, or releasing for percussive envelopes
    Sustain,
    /// Attenuation rising linearly to silence after key off
    Release,
}

/// Who keyed an operator on. The chip tracks both sources separately so
/// a melodic key-off can't cut a drum hit short and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Normal = 0x01,
    Rhythm = 0x02,
}

/// Role of a channel in the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelType {
    #[default]
    TwoOperator,
    /// Lower channel of a 4-operator pair, owns pitch and key
    FourOperatorPrimary,
    /// Upper channel of a 4-operator pair, carries the output taps
    FourOperatorSecondary,
    /// Channels 6-8 while rhythm mode is on
    Rhythm,
}

/// Phase modulation source of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modulation {
    #[default]
    Zero,
    /// Weighted sum of the operator's own last two outputs
    Feedback,
    /// Latest output of another operator
    Operator(usize),
}

/// Pitch of a channel as seen by its operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pitch {
    /// 10-bit frequency number
    pub f_num: u16,
    /// 3-bit octave
    pub block: u8,
    /// Key scale value used for rate scaling
    pub ksv: u8,
}

/// A single FM operator (slot)
///
/// Holds one envelope generator and one phase generator plus the register
/// fields that shape them.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Owning channel index
    channel: usize,
    /// Latest output sample
    out: i16,
    /// Feedback modulation derived from `prev_out`
    fb_mod: i16,
    /// Two previous outputs, newest first
    prev_out: [i16; 2],
    /// Phase modulation source
    modulation: Modulation,
    /// Envelope attenuation, 0 loudest, 0x1ff silent
    eg_rout: i16,
    /// Attenuation including total level, KSL and tremolo
    eg_out: u16,
    /// Increment chosen for the current sample
    eg_inc: u8,
    eg_state: EnvelopeState,
    /// Combined rate for the current state, 0..=60
    eg_rate: u8,
    /// Key scale level attenuation before the KSL shift
    eg_ksl: u8,
    /// Register 0x20 bit 7
    tremolo: bool,
    /// Register 0x20 bit 6
    vibrato: bool,
    /// Register 0x20 bit 5, envelope holds at the sustain level
    sustained: bool,
    /// Register 0x20 bit 4
    ksr: bool,
    mult: u8,
    ksl: u8,
    total_level: u8,
    attack: u8,
    decay: u8,
    /// Sustain level, with 15 already expanded to 0x1f
    sustain_level: u8,
    release: u8,
    waveform: Waveform,
    /// `KeyKind` bits currently holding the note
    key: u8,
    /// Phase accumulator, the top 10 of the low 19 bits are the waveform phase
    phase: u32,
}

impl Default for Operator {
    fn default() -> Self {
        Self {
            channel: 0,
            out: 0,
            fb_mod: 0,
            prev_out: [0, 0],
            modulation: Modulation::Zero,
            eg_rout: ENV_SILENT,
            eg_out: ENV_SILENT as u16,
            eg_inc: 0,
            eg_state: EnvelopeState::Off,
            eg_rate: 0,
            eg_ksl: 0,
            tremolo: false,
            vibrato: false,
            sustained: false,
            ksr: false,
            mult: 0,
            ksl: 0,
            total_level: 0,
            attack: 0,
            decay: 0,
            sustain_level: 0,
            release: 0,
            waveform: Waveform::Sine,
            key: 0,
            phase: 0,
        }
    }
}

/// One FM channel: two operators, a pitch, feedback and algorithm wiring
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// The channel's operators, the second is always three slots after the first
    operators: [usize; 2],
    /// Partner channel for 4-operator mode
    pair: Option<usize>,
    channel_type: ChannelType,
    pitch: Pitch,
    /// Feedback amount 0-7, 0 disables feedback
    feedback: u8,
    /// Register 0xC0 bit 0
    connection: u8,
    /// 2-op: the connection bit. 4-op: `0x04 | primary << 1 | secondary` on
    /// the secondary, `0x08` on the primary.
    algorithm: u8,
    /// Operators summed into the channel output, `None` reads as zero
    taps: [Option<usize>; 4],
    /// Left enable, 0 or all ones
    mask_left: i16,
    /// Right enable, 0 or all ones
    mask_right: i16,
    /// Continuous left gain, only used with full panning
    gain_left: f32,
    /// Continuous right gain, only used with full panning
    gain_right: f32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            operators: [0, 3],
            pair: None,
            channel_type: ChannelType::TwoOperator,
            pitch: Pitch::default(),
            feedback: 0,
            connection: 0,
            algorithm: 0,
            taps: [None; 4],
            mask_left: -1,
            mask_right: -1,
            gain_left: 1.0,
            gain_right: 1.0,
        }
    }
}

/// The OPL3 chip
///
/// Owns all operators and channels plus the chip-wide LFO, noise and mode
/// state. Register writes apply immediately; each generated sample advances
/// every operator exactly once.
#[derive(Debug, Clone)]
pub struct Chip {
    operators: [Operator; OPERATOR_COUNT],
    channels: [Channel; CHANNEL_COUNT],
    noise: Noise,
    /// Samples generated since reset
    timer: u64,
    /// Register 0x105 bit 0
    new_mode: bool,
    /// Register 0x08 bit 6
    note_select: u8,
    /// Register 0x104, 4-operator pair enables
    four_op: u8,
    /// Register 0xBD bits 5-0
    rhythm: u8,
    /// Register 0xBD bit 7
    tremolo_depth: bool,
    /// Register 0xBD bit 6
    vibrato_depth: bool,
    /// Tremolo triangle position, 0..=105
    tremolo_step: u8,
    tremolo_falling: bool,
    /// Attenuation added to operators with tremolo enabled
    tremolo_value: u8,
    /// Left and right mix accumulators, the right one is emitted a sample late
    mix: [i32; 2],
    /// Continuous panning instead of the 0xC0 enable bits
    full_pan: bool,
    resampler: Resampler,
}

impl Default for Chip {
    fn default() -> Self {
        Self::new(false)
    }
}
