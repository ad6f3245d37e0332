//! ILI9806E panel controller bring-up.
//!
//! The ILI9806E is the on-glass controller behind the 480×800 RGB panels
//! this pipeline was built for. Before the parallel video input is trusted
//! the controller must be walked through a vendor-specified register script:
//! power rails, VCOM flicker compensation, both gamma curve tables, and the
//! gate-in-panel (GIP) scan timing, followed by sleep-out and display-on.
//!
//! The controller's register space is page-addressed: a sentinel command
//! (`0xFF` plus a five-byte key) selects the active page, and every later
//! command byte addresses a register within that page. The script below
//! therefore only works in exactly the order given; dropping or reordering a
//! page select redirects every subsequent write.
//!
//! The script is data, not logic: one static table of
//! (command, payload, settle) entries and a loop that replays it over a
//! [`PanelChannel`]. The payload bytes are the panel vendor's tuning values
//! and are not meaningful individually.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::serial::PanelChannel;

/// Milliseconds the reset line is held high before the reset pulse.
pub const RESET_PREAMBLE_MS: u32 = 1;
/// Milliseconds the reset line is held low to reset the controller.
pub const RESET_PULSE_MS: u32 = 10;
/// Milliseconds the controller needs after reset before accepting commands.
pub const RESET_SETTLE_MS: u32 = 200;

/// One entry of the panel initialization script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelCommand {
    /// Register (command) byte.
    pub command: u8,
    /// Data bytes written after the command.
    pub data: &'static [u8],
    /// Delay after the entry completes, zero for most entries.
    pub settle_ms: u32,
}

impl PanelCommand {
    const fn new(command: u8, data: &'static [u8]) -> Self {
        Self {
            command,
            data,
            settle_ms: 0,
        }
    }

    const fn with_settle(command: u8, data: &'static [u8], settle_ms: u32) -> Self {
        Self {
            command,
            data,
            settle_ms,
        }
    }
}

/// The full ILI9806E initialization script, in transmission order.
pub const INIT_SEQUENCE: &[PanelCommand] = &[
    // Page 1: interface mode, power rails, VCOM, gamma references.
    PanelCommand::new(0xFF, &[0xFF, 0x98, 0x06, 0x04, 0x01]),
    PanelCommand::new(0x08, &[0x00]),
    PanelCommand::new(0x20, &[0x00]),
    PanelCommand::new(0x21, &[0x01]),
    PanelCommand::new(0x30, &[0x02]),
    PanelCommand::new(0x31, &[0x00]),
    PanelCommand::new(0x40, &[0x00]),
    PanelCommand::new(0x41, &[0x44]),
    PanelCommand::new(0x42, &[0x00]),
    PanelCommand::new(0x43, &[0x80]),
    PanelCommand::new(0x44, &[0x86]),
    PanelCommand::new(0x46, &[0x34]),
    PanelCommand::new(0x50, &[0x94]),
    PanelCommand::new(0x51, &[0x94]),
    PanelCommand::new(0x52, &[0x00]),
    PanelCommand::new(0x53, &[0x67]),
    PanelCommand::new(0x54, &[0x00]),
    PanelCommand::new(0x55, &[0x67]),
    PanelCommand::new(0x60, &[0x07]),
    PanelCommand::new(0x61, &[0x04]),
    PanelCommand::new(0x62, &[0x08]),
    PanelCommand::new(0x63, &[0x04]),
    // Positive gamma curve.
    PanelCommand::new(0xA0, &[0x00]),
    PanelCommand::new(0xA1, &[0x0B]),
    PanelCommand::new(0xA2, &[0x13]),
    PanelCommand::new(0xA3, &[0x0C]),
    PanelCommand::new(0xA4, &[0x05]),
    PanelCommand::new(0xA5, &[0x0C]),
    PanelCommand::new(0xA6, &[0x08]),
    PanelCommand::new(0xA7, &[0x06]),
    PanelCommand::new(0xA8, &[0x06]),
    PanelCommand::new(0xA9, &[0x0A]),
    PanelCommand::new(0xAA, &[0x0F]),
    PanelCommand::new(0xAB, &[0x06]),
    PanelCommand::new(0xAC, &[0x12]),
    PanelCommand::new(0xAD, &[0x18]),
    PanelCommand::new(0xAE, &[0x12]),
    PanelCommand::new(0xAF, &[0x0B]),
    // Negative gamma curve.
    PanelCommand::new(0xC0, &[0x00]),
    PanelCommand::new(0xC1, &[0x0B]),
    PanelCommand::new(0xC2, &[0x13]),
    PanelCommand::new(0xC3, &[0x0C]),
    PanelCommand::new(0xC4, &[0x05]),
    PanelCommand::new(0xC5, &[0x0C]),
    PanelCommand::new(0xC6, &[0x08]),
    PanelCommand::new(0xC7, &[0x06]),
    PanelCommand::new(0xC8, &[0x06]),
    PanelCommand::new(0xC9, &[0x0A]),
    PanelCommand::new(0xCA, &[0x0F]),
    PanelCommand::new(0xCB, &[0x06]),
    PanelCommand::new(0xCC, &[0x12]),
    PanelCommand::new(0xCD, &[0x18]),
    PanelCommand::new(0xCE, &[0x12]),
    PanelCommand::new(0xCF, &[0x0B]),
    // Page 6: GIP scan control.
    PanelCommand::new(0xFF, &[0xFF, 0x98, 0x06, 0x04, 0x06]),
    PanelCommand::new(0x00, &[0x21]),
    PanelCommand::new(0x01, &[0x0A]),
    PanelCommand::new(0x02, &[0x00]),
    PanelCommand::new(0x03, &[0x00]),
    PanelCommand::new(0x04, &[0x32]),
    PanelCommand::new(0x05, &[0x32]),
    PanelCommand::new(0x06, &[0x98]),
    PanelCommand::new(0x07, &[0x06]),
    PanelCommand::new(0x08, &[0x05]),
    PanelCommand::new(0x09, &[0x00]),
    PanelCommand::new(0x0A, &[0x00]),
    PanelCommand::new(0x0B, &[0x00]),
    PanelCommand::new(0x0C, &[0x32]),
    PanelCommand::new(0x0D, &[0x32]),
    PanelCommand::new(0x0E, &[0x01]),
    PanelCommand::new(0x0F, &[0x01]),
    PanelCommand::new(0x10, &[0xF0]),
    PanelCommand::new(0x11, &[0xF0]),
    PanelCommand::new(0x12, &[0x00]),
    PanelCommand::new(0x13, &[0x00]),
    PanelCommand::new(0x14, &[0x00]),
    PanelCommand::new(0x15, &[0x43]),
    PanelCommand::new(0x16, &[0x0B]),
    PanelCommand::new(0x17, &[0x00]),
    PanelCommand::new(0x18, &[0x00]),
    PanelCommand::new(0x19, &[0x00]),
    PanelCommand::new(0x1A, &[0x00]),
    PanelCommand::new(0x1B, &[0x00]),
    PanelCommand::new(0x1C, &[0x00]),
    PanelCommand::new(0x1D, &[0x00]),
    // GIP output mapping.
    PanelCommand::new(0x20, &[0x01]),
    PanelCommand::new(0x21, &[0x23]),
    PanelCommand::new(0x22, &[0x45]),
    PanelCommand::new(0x23, &[0x67]),
    PanelCommand::new(0x24, &[0x01]),
    PanelCommand::new(0x25, &[0x23]),
    PanelCommand::new(0x26, &[0x45]),
    PanelCommand::new(0x27, &[0x67]),
    PanelCommand::new(0x30, &[0x01]),
    PanelCommand::new(0x31, &[0x11]),
    PanelCommand::new(0x32, &[0x00]),
    PanelCommand::new(0x33, &[0x22]),
    PanelCommand::new(0x34, &[0x22]),
    PanelCommand::new(0x35, &[0xCB]),
    PanelCommand::new(0x36, &[0xDA]),
    PanelCommand::new(0x37, &[0xAD]),
    PanelCommand::new(0x38, &[0xBC]),
    PanelCommand::new(0x39, &[0x66]),
    PanelCommand::new(0x3A, &[0x77]),
    PanelCommand::new(0x3B, &[0x22]),
    PanelCommand::new(0x3C, &[0x22]),
    PanelCommand::new(0x3D, &[0x22]),
    PanelCommand::new(0x3E, &[0x22]),
    PanelCommand::new(0x3F, &[0x22]),
    PanelCommand::new(0x40, &[0x22]),
    PanelCommand::new(0x52, &[0x10]),
    // Page 7: undocumented vendor tuning.
    PanelCommand::new(0xFF, &[0xFF, 0x98, 0x06, 0x04, 0x07]),
    PanelCommand::new(0x18, &[0x1D]),
    PanelCommand::new(0x02, &[0x77]),
    PanelCommand::new(0xE1, &[0x79]),
    // Page 0: scan direction, pixel format, then wake the panel.
    PanelCommand::new(0xFF, &[0xFF, 0x98, 0x06, 0x04, 0x00]),
    PanelCommand::new(0x36, &[0x01]),
    PanelCommand::new(0x3A, &[0x70]),
    PanelCommand::with_settle(0x11, &[], 120),
    PanelCommand::with_settle(0x29, &[], 25),
];

/// Pulses the panel's hardware reset line.
///
/// High for [`RESET_PREAMBLE_MS`], low for [`RESET_PULSE_MS`], then high
/// again for [`RESET_SETTLE_MS`] while the controller's internal rails come
/// up. No command may be sent before this completes.
///
/// # Errors
/// Propagates the first reset-line fault.
pub fn reset_pulse<Rst, D>(reset: &mut Rst, delay: &mut D) -> Result<(), Rst::Error>
where
    Rst: OutputPin,
    D: DelayNs,
{
    reset.set_high()?;
    delay.delay_ms(RESET_PREAMBLE_MS);
    reset.set_low()?;
    delay.delay_ms(RESET_PULSE_MS);
    reset.set_high()?;
    delay.delay_ms(RESET_SETTLE_MS);
    Ok(())
}

/// Replays [`INIT_SEQUENCE`] over a panel channel.
///
/// The controller must have completed its reset pulse first.
///
/// # Errors
/// Propagates the first channel fault; the script stops at the failing
/// entry.
pub fn run_init<C, D>(channel: &mut C, delay: &mut D) -> Result<(), C::Error>
where
    C: PanelChannel,
    D: DelayNs,
{
    for entry in INIT_SEQUENCE {
        channel.send_command(entry.command)?;
        for &byte in entry.data {
            channel.send_data(byte)?;
        }
        if entry.settle_ms > 0 {
            delay.delay_ms(entry.settle_ms);
        }
    }
    Ok(())
}

/// Full panel bring-up: reset pulse, then the initialization script.
///
/// # Errors
/// Propagates the first reset-line or channel fault.
pub fn initialize<C, Rst, D, E>(channel: &mut C, reset: &mut Rst, delay: &mut D) -> Result<(), E>
where
    C: PanelChannel<Error = E>,
    Rst: OutputPin<Error = E>,
    D: DelayNs,
{
    reset_pulse(reset, delay)?;
    run_init(channel, delay)
}
