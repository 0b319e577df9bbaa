//! Built-in register pattern: a four chord progression over a simple drum
//! loop, timed in output frames.

use std::io::{self, Write};

use log::debug;
use opl3_emulator::rhythm::{BASS_DRUM, HI_HAT, RHYTHM_ENABLE, SNARE};
use opl3_emulator::{Chip, NATIVE_RATE};

/// Frames rendered per `generate_resampled` call
const BLOCK_FRAMES: u32 = 512;
const BEATS_PER_LOOP: u32 = 16;
const BEATS_PER_CHORD: u32 = 4;

/// Register offsets of the per-operator groups
const OPERATOR_GROUPS: [u16; 5] = [0x20, 0x40, 0x60, 0x80, 0xe0];
/// Offset of each bank 0 channel's modulator, its carrier sits 3 slots later
const CHANNEL_SLOT: [u16; 9] = [0x00, 0x01, 0x02, 0x08, 0x09, 0x0a, 0x10, 0x11, 0x12];

/// A register write due at `frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub frame: u32,
    pub reg: u16,
    pub val: u8,
}

impl Event {
    pub const fn new(frame: u32, reg: u16, val: u8) -> Self {
        Self { frame, reg, val }
    }
}

/// Register values for the five operator groups, in `OPERATOR_GROUPS` order
struct Patch {
    modulator: [u8; 5],
    carrier: [u8; 5],
    /// 0xC0: both outputs, feedback and connection
    feedback: u8,
}

const PIANO: Patch = Patch {
    modulator: [0x01, 0x1a, 0xf2, 0x54, 0x00],
    carrier: [0x01, 0x00, 0xf2, 0x56, 0x00],
    feedback: 0x36,
};

const BASS_DRUM_PATCH: Patch = Patch {
    modulator: [0x00, 0x0b, 0xa8, 0x4c, 0x00],
    carrier: [0x00, 0x00, 0xd6, 0x4f, 0x00],
    feedback: 0x30,
};

/// Channel 7 carries hi-hat on its modulator and snare on its carrier
const HAT_SNARE_PATCH: Patch = Patch {
    modulator: [0x00, 0x06, 0xf8, 0x66, 0x00],
    carrier: [0x00, 0x00, 0xf8, 0x56, 0x00],
    feedback: 0x30,
};

/// Root, third and fifth of each chord in Hz
const CHORDS: [[f64; 3]; 4] = [
    [261.63, 329.63, 392.00],
    [220.00, 261.63, 329.63],
    [174.61, 220.00, 261.63],
    [196.00, 246.94, 293.66],
];

/// Frequency number for `freq` Hz in octave `block`, clamped to 10 bits
pub fn f_num(freq: f64, block: u8) -> u16 {
    let f_num = freq * f64::from(1u32 << (20 - block as u32)) / f64::from(NATIVE_RATE);
    (f_num.round() as u16).min(0x3ff)
}

fn beat(rate: u32) -> u32 {
    rate / 4
}

/// Frames in one pass of the pattern
pub fn loop_frames(rate: u32) -> u32 {
    beat(rate) * BEATS_PER_LOOP
}

/// Frames for `loops` passes plus half a second of release tail, `None` when
/// that doesn't fit the frame counter
pub fn total_frames(rate: u32, loops: u32) -> Option<u32> {
    loop_frames(rate).checked_mul(loops)?.checked_add(rate / 2)
}

fn patch_writes(events: &mut Vec<Event>, channel: usize, patch: &Patch) {
    let slot = CHANNEL_SLOT[channel];
    for (i, group) in OPERATOR_GROUPS.iter().enumerate() {
        events.push(Event::new(0, group + slot, patch.modulator[i]));
        events.push(Event::new(0, group + slot + 3, patch.carrier[i]));
    }
    events.push(Event::new(0, 0xc0 + channel as u16, patch.feedback));
}

fn pitch_writes(
    events: &mut Vec<Event>,
    frame: u32,
    channel: usize,
    f_num: u16,
    block: u8,
    key: bool,
) {
    let channel = channel as u16;
    let high = ((f_num >> 8) as u8 & 0x03) | (block << 2) | if key { 0x20 } else { 0 };
    events.push(Event::new(frame, 0xa0 + channel, f_num as u8));
    events.push(Event::new(frame, 0xb0 + channel, high));
}

/// The register writes for `loops` passes of the pattern, ordered by frame
pub fn pattern(rate: u32, loops: u32) -> Vec<Event> {
    let beat = beat(rate);
    let mut events = vec![Event::new(0, 0x105, 0x01)];
    for channel in 0..3 {
        patch_writes(&mut events, channel, &PIANO);
    }
    patch_writes(&mut events, 6, &BASS_DRUM_PATCH);
    patch_writes(&mut events, 7, &HAT_SNARE_PATCH);
    // drum pitches, never keyed through 0xB0
    pitch_writes(&mut events, 0, 6, 0x158, 2, false);
    pitch_writes(&mut events, 0, 7, 0x200, 4, false);
    pitch_writes(&mut events, 0, 8, 0x200, 4, false);
    events.push(Event::new(0, 0xbd, RHYTHM_ENABLE));

    for pass in 0..loops {
        let start = pass * loop_frames(rate);
        for (i, chord) in CHORDS.iter().enumerate() {
            let on = start + i as u32 * BEATS_PER_CHORD * beat;
            let off = on + BEATS_PER_CHORD * beat - beat / 2;
            for (channel, freq) in chord.iter().enumerate() {
                let f_num = f_num(*freq, 4);
                pitch_writes(&mut events, on, channel, f_num, 4, true);
                pitch_writes(&mut events, off, channel, f_num, 4, false);
            }
        }
        for n in 0..BEATS_PER_LOOP {
            let hit = start + n * beat;
            let drums = if n % 2 == 0 { BASS_DRUM } else { SNARE };
            events.push(Event::new(hit, 0xbd, RHYTHM_ENABLE | drums | HI_HAT));
            events.push(Event::new(hit + beat / 4, 0xbd, RHYTHM_ENABLE));
        }
    }
    events.sort_by_key(|e| e.frame);
    events
}

/// Spreads the chord voices across the stereo field on a full pan chip
pub fn place_voices(chip: &mut Chip) {
    if !chip.full_pan() {
        return;
    }
    for (channel, pan) in [(0, 24), (1, 64), (2, 104)] {
        chip.set_pan_position(channel, pan);
    }
}

/// Renders `frames` frames at the chip's output rate, applying each event
/// before the frame it is due at. Samples are written as interleaved
/// little endian i16.
pub fn play<W: Write>(
    chip: &mut Chip,
    events: &[Event],
    frames: u32,
    out: &mut W,
) -> io::Result<()> {
    let mut buf = vec![0i16; BLOCK_FRAMES as usize * 2];
    let mut bytes = Vec::with_capacity(buf.len() * 2);
    let mut frame = 0;
    let mut next = 0;
    while frame < frames {
        while let Some(event) = events.get(next).filter(|e| e.frame <= frame) {
            chip.write_reg(event.reg, event.val);
            next += 1;
        }
        let until = events.get(next).map_or(frames, |e| e.frame.min(frames));
        let count = (until - frame).min(BLOCK_FRAMES);
        let block = &mut buf[..count as usize * 2];
        chip.generate_resampled(block);

        bytes.clear();
        for sample in block.iter() {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        out.write_all(&bytes)?;
        frame += count;
    }
    debug!("Applied {} of {} events", next, events.len());
    Ok(())
}
