//! Bit-banged three-wire serial channel for panel configuration.
//!
//! The panel's on-glass controller is configured over a write-only serial
//! link: chip select (active LOW), clock, and data in. Each transfer is nine
//! bits long: a framing bit that tells the controller whether the byte is a
//! command or a data payload, then the byte itself, most significant bit
//! first. The controller samples the data line on every rising clock edge
//! while select is asserted.
//!
//! One byte on the wire:
//!
//! ```text
//! CS   ‾\_______________________________________/‾
//! SCL  ‾\_/‾\_/‾\_/‾\_/‾\_/‾\_/‾\_/‾\_/‾\_/‾
//!         F   b7  b6  b5  b4  b3  b2  b1  b0
//! ```
//!
//! where `F` is 0 for a command byte and 1 for a data byte. Between bytes
//! the lines rest with select deasserted and the clock high.
//!
//! # Timing
//! No delay is inserted between edges: the channel toggles as fast as the
//! GPIO implementation allows, and the panel's setup/hold margins are wide
//! enough for GPIO paths that go through a syscall or an AXI write. A host
//! whose pin toggles are faster than the panel's documented minimum must
//! enforce its own floor, for example by wrapping its [`OutputPin`]s in a
//! pacing adapter; this module will not slow itself down artificially.

use embedded_hal::digital::OutputPin;

/// Byte-level sink for panel configuration traffic.
///
/// [`CommandPort`] is the hardware implementation; the panel initializer is
/// written against this trait so its script can be verified against a
/// recording fake.
pub trait PanelChannel {
    /// Error produced by the underlying lines.
    type Error;

    /// Shifts out one command byte (framing bit 0).
    ///
    /// # Errors
    /// Propagates the first line fault; the transfer stops mid-frame.
    fn send_command(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Shifts out one data byte (framing bit 1).
    ///
    /// # Errors
    /// Propagates the first line fault; the transfer stops mid-frame.
    fn send_data(&mut self, byte: u8) -> Result<(), Self::Error>;
}

/// Three-wire write-only serial port over GPIO lines.
///
/// The port owns its pins from construction to [`release`](Self::release).
/// All three lines must idle high before the first transfer; the port leaves
/// them that way after every byte (select deasserted, clock high).
pub struct CommandPort<Cs, Scl, Sda> {
    select: Cs,
    clock: Scl,
    data: Sda,
}

impl<E, Cs, Scl, Sda> CommandPort<Cs, Scl, Sda>
where
    Cs: OutputPin<Error = E>,
    Scl: OutputPin<Error = E>,
    Sda: OutputPin<Error = E>,
{
    /// Wraps three claimed output lines into a port.
    ///
    /// The lines are expected to have been claimed driven high.
    pub fn new(select: Cs, clock: Scl, data: Sda) -> Self {
        Self {
            select,
            clock,
            data,
        }
    }

    /// Hands the lines back, consuming the port.
    pub fn release(self) -> (Cs, Scl, Sda) {
        (self.select, self.clock, self.data)
    }

    fn set_data(&mut self, level: bool) -> Result<(), E> {
        if level {
            self.data.set_high()
        } else {
            self.data.set_low()
        }
    }

    fn shift_frame(&mut self, framing: bool, mut byte: u8) -> Result<(), E> {
        self.select.set_low()?;
        self.clock.set_low()?;
        self.set_data(framing)?;
        // Frame marker: the controller latches command/data on this edge.
        self.clock.set_high()?;
        for _ in 0..8 {
            self.clock.set_low()?;
            self.set_data(byte & 0x80 != 0)?;
            self.clock.set_high()?;
            byte <<= 1;
        }
        self.select.set_high()
    }
}

impl<E, Cs, Scl, Sda> PanelChannel for CommandPort<Cs, Scl, Sda>
where
    Cs: OutputPin<Error = E>,
    Scl: OutputPin<Error = E>,
    Sda: OutputPin<Error = E>,
{
    type Error = E;

    fn send_command(&mut self, byte: u8) -> Result<(), E> {
        self.shift_frame(false, byte)
    }

    fn send_data(&mut self, byte: u8) -> Result<(), E> {
        self.shift_frame(true, byte)
    }
}
