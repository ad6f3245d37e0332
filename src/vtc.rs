//! Video timing controller (VTC) driver.
//!
//! The timing controller is the fabric block that turns the raw pixel
//! stream into a panel signal: it counts pixels and lines against
//! programmed totals and drives HSYNC, VSYNC and data-enable with the
//! configured polarities. The pipeline programs it once at bring-up and
//! leaves it free running.
//!
//! Two hardware properties shape this driver:
//!
//! - The register window is **write only** from the host's point of view
//!   (see [`RegisterBus`]), so the driver mirrors the control word in
//!   [`Vtc`] instead of reading it back.
//! - The timing registers are **double buffered**: writes land in shadow
//!   registers and only reach the running generator when the register
//!   update bit of the control word is set. [`Vtc::configure`] therefore
//!   requires a disabled generator, and [`Vtc::enable`] latches the shadow
//!   set and starts the counters in one control write.

use bitfield::bitfield;

use crate::hal::RegisterBus;
use crate::{DisplayMode, Error};

/// Largest total count the generator's 13-bit pixel and line counters hold.
pub const MAX_TOTAL: u32 = 0x1FFF;

/// Byte offsets of the generator's registers within its window.
pub mod reg {
    /// Control: generator enable, register update, soft reset.
    pub const CONTROL: u32 = 0x000;
    /// Active size: vertical count in bits 28:16, horizontal in bits 12:0.
    pub const ACTIVE_SIZE: u32 = 0x020;
    /// Total pixels per line including blanking.
    pub const HTOTAL: u32 = 0x024;
    /// HSYNC deassertion count in the high half-word, assertion in the low.
    pub const HSYNC: u32 = 0x028;
    /// Total lines per frame including blanking.
    pub const VTOTAL: u32 = 0x02C;
    /// VSYNC deassertion count in the high half-word, assertion in the low.
    pub const VSYNC: u32 = 0x030;
    /// Output signal polarities.
    pub const POLARITY: u32 = 0x034;
}

bitfield! {
    /// Control register word.
    ///
    /// Generator enable takes effect immediately. The timing registers are
    /// double buffered and latch into the generator while the register
    /// update bit is set. Soft reset returns the whole block to power-on
    /// defaults.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    struct Control(u32);
    impl Debug;
    pub soft_reset, set_soft_reset: 31;
    pub reg_update, set_reg_update: 1;
    pub enable, set_enable: 0;
}

bitfield! {
    /// Polarity register word.
    ///
    /// A set bit selects active high, or for the pixel clock the rising
    /// drive edge.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    struct Polarity(u32);
    impl Debug;
    pub pixclk_rising, set_pixclk_rising: 3;
    pub de_active_high, set_de_active_high: 2;
    pub vsync_active_high, set_vsync_active_high: 1;
    pub hsync_active_high, set_hsync_active_high: 0;
}

/// Driver for one timing generator instance.
///
/// Owns its register bus for the pipeline's lifetime and shadows the
/// control word, so the enable state is tracked without a read path.
#[derive(Debug)]
pub struct Vtc<B> {
    bus: B,
    control: Control,
}

impl<B: RegisterBus> Vtc<B> {
    /// Wraps a register bus.
    ///
    /// The generator is taken to be in its power-on state (disabled); call
    /// [`reset`](Self::reset) first if its history is unknown.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            control: Control(0),
        }
    }

    /// Soft resets the generator to power-on defaults.
    ///
    /// # Errors
    /// Forwards the bus fault; the shadow state still records the
    /// generator as disabled.
    pub fn reset(&mut self) -> Result<(), Error> {
        let mut word = Control(0);
        word.set_soft_reset(true);
        self.control = Control(0);
        self.bus.write(reg::CONTROL, word.0)?;
        self.bus.write(reg::CONTROL, self.control.0)
    }

    /// Stops the generator while keeping the shadow registers writable.
    ///
    /// # Errors
    /// Forwards the bus fault.
    pub fn disable(&mut self) -> Result<(), Error> {
        self.control.set_enable(false);
        self.control.set_reg_update(true);
        self.bus.write(reg::CONTROL, self.control.0)
    }

    /// Programs the full timing set for `mode` into the shadow registers.
    ///
    /// The generator must be disabled; the values take effect on the next
    /// [`enable`](Self::enable).
    ///
    /// # Errors
    /// Forwards the first bus fault. The shadow register file is then in a
    /// mixed state and the caller must reset or reconfigure before
    /// enabling.
    pub fn configure(&mut self, mode: &DisplayMode) -> Result<(), Error> {
        debug_assert!(!self.control.enable(), "configure with generator running");

        let mut polarity = Polarity(0);
        polarity.set_hsync_active_high(mode.hsync_active_high);
        polarity.set_vsync_active_high(mode.vsync_active_high);
        polarity.set_de_active_high(mode.de_active_high);
        polarity.set_pixclk_rising(mode.pixclk_rising);

        self.bus
            .write(reg::ACTIVE_SIZE, (mode.vactive << 16) | mode.hactive)?;
        self.bus.write(reg::HTOTAL, mode.htotal())?;
        self.bus
            .write(reg::HSYNC, (mode.hsync_end() << 16) | mode.hsync_start())?;
        self.bus.write(reg::VTOTAL, mode.vtotal())?;
        self.bus
            .write(reg::VSYNC, (mode.vsync_end() << 16) | mode.vsync_start())?;
        self.bus.write(reg::POLARITY, polarity.0)
    }

    /// Latches the shadow registers and starts the generator.
    ///
    /// # Errors
    /// Forwards the bus fault; the shadow state then still records the
    /// generator as disabled.
    pub fn enable(&mut self) -> Result<(), Error> {
        let mut next = self.control;
        next.set_enable(true);
        next.set_reg_update(true);
        self.bus.write(reg::CONTROL, next.0)?;
        self.control = next;
        Ok(())
    }

    /// Whether the shadow state records the generator as running.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.control.0 & 1 != 0
    }

    /// Releases the register bus.
    pub fn release(self) -> B {
        self.bus
    }
}
