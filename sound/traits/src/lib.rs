//! Interface between FM chip emulators and the hosts that drive them, such as
//! MIDI or tracker players and audio backends.

/// An OPL register level emulator
///
/// Hosts feed it timed register writes and pull sample blocks. Everything
/// runs on the caller's thread; an implementation never blocks.
pub trait OplEmulator: Send {
    /// Return the chip to its power-on state
    fn reset(&mut self);

    /// Write a value to a register. Bit 8 of `reg` selects the second bank.
    fn write_reg(&mut self, reg: u16, val: u8);

    /// Fill an interleaved stereo buffer at the chip's native rate
    fn generate(&mut self, output: &mut [i16]);

    /// Mix interleaved stereo output into `output`, adding to what is already
    /// there. Samples are scaled so a full scale chip fits comfortably in -1..1.
    fn update(&mut self, output: &mut [f32]);

    /// Set the left/right gain of a channel. Emulators without continuous
    /// panning may ignore this.
    fn set_panning(&mut self, channel: usize, left: f32, right: f32);
}
