//! Bring-up and streaming orchestration for VDMA-fed RGB panel display
//! pipelines on FPGA SoCs.
//!
//! ## How the pipeline works
//!
//! The display path this crate drives is built from three fabric blocks wired
//! in series: a video DMA engine reads scanlines out of a framebuffer in
//! system memory, a video timing controller (VTC) wraps the pixel stream in
//! sync and blanking pulses, and the combined signal feeds either an RGB LCD
//! panel or a pass-through digital sink. Nothing in the path is double
//! buffered by the host: once armed, the DMA engine re-transfers the same
//! frame region forever and the CPU only ever touches pixel memory.
//!
//! ### Signal path
//! - **Framebuffer** – one physically contiguous, write-combined region in
//!   system memory, scanned out line by line
//! - **VDMA** – streaming DMA engine in park/auto-repeat mode; one interleaved
//!   descriptor describes a whole frame and the engine re-arms itself on every
//!   frame boundary without host involvement
//! - **VTC** – timing generator producing HSYNC/VSYNC/DE from programmed
//!   total/sync/active counts and polarity bits
//! - **Panel** – an LCD whose on-glass controller must be configured over a
//!   separate three-wire serial link before the video signal is trusted
//!
//! ### Panel command interface
//! RGB panels in this class carry a write-only three-wire configuration port
//! next to the parallel video bus:
//! - **CS** – chip select, active LOW
//! - **SCL** – serial clock; the controller samples on the rising edge
//! - **SDI** – serial data in; one framing bit (0 = command, 1 = data) then
//!   eight payload bits, most significant first
//! - **RST** – hardware reset, pulsed before any command is sent
//!
//! There is no read-back path. A missing or miswired panel is
//! indistinguishable from a working one at this layer.
//!
//! ### Bring-up order
//! 1. Resolve the pixel format and display mode from configuration, clamping
//!    the active area to the supported range.
//! 2. Allocate and zero the framebuffer.
//! 3. Set the pixel clock rate, enable it, and let it settle.
//! 4. Reset, configure, and enable the VTC, and let the signal settle.
//! 5. For a physical panel: pulse reset and run the panel's fixed
//!    initialization script over the serial port.
//! 6. Program one interleaved frame descriptor, put the DMA channel in
//!    auto-repeat mode, and issue it.
//! 7. Register the finished framebuffer with the display-consumption layer.
//!
//! Every step that can fail unwinds the steps already completed, in reverse,
//! before the error is returned; a pipeline is either fully registered or
//! fully absent. Teardown stops the timing generator and pixel clock before
//! the DMA channel is released so the sink never sees sync pulses with no
//! data source behind them.
//!
//! ## Capability model
//!
//! The host platform supplies every hardware touchpoint through a small trait
//! in [`hal`]: the pixel clock, the VTC register bus, the DMA engine, the
//! DMA-capable allocator, and the display-registration layer. Panel lines are
//! plain [`embedded_hal::digital::OutputPin`]s and settle delays go through
//! [`embedded_hal::delay::DelayNs`]. The orchestrator in [`pipeline`] owns
//! one value of each for its whole life, so independent pipeline instances
//! coexist and the entire bring-up is testable against in-memory fakes.
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public data types so they can be
//! emitted with the `defmt` logging framework. No functional changes; purely
//! adds trait impls.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::struct_excessive_bools)]

use core::convert::Infallible;
use core::fmt;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;

#[cfg(test)]
mod fakes;
pub mod hal;
pub mod ili9806e;
pub mod pipeline;
pub mod serial;
pub mod vdma;
pub mod vtc;

/// Smallest active width the pipeline will program.
pub const MIN_ACTIVE_WIDTH: u32 = 480;
/// Largest active width the pipeline will program.
pub const MAX_ACTIVE_WIDTH: u32 = 1920;
/// Smallest active height the pipeline will program.
pub const MIN_ACTIVE_HEIGHT: u32 = 272;
/// Largest active height the pipeline will program.
pub const MAX_ACTIVE_HEIGHT: u32 = 1080;

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Example
/// ```
/// assert_eq!(vdma_display::align_up(1000, 4096), 4096);
/// assert_eq!(vdma_display::align_up(8192, 4096), 8192);
/// ```
#[must_use]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Saturates a requested active width into the supported range.
#[must_use]
pub const fn clamp_active_width(width: u32) -> u32 {
    if width < MIN_ACTIVE_WIDTH {
        MIN_ACTIVE_WIDTH
    } else if width > MAX_ACTIVE_WIDTH {
        MAX_ACTIVE_WIDTH
    } else {
        width
    }
}

/// Saturates a requested active height into the supported range.
#[must_use]
pub const fn clamp_active_height(height: u32) -> u32 {
    if height < MIN_ACTIVE_HEIGHT {
        MIN_ACTIVE_HEIGHT
    } else if height > MAX_ACTIVE_HEIGHT {
        MAX_ACTIVE_HEIGHT
    } else {
        height
    }
}

/// Position of one color channel inside a packed pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelBits {
    /// Bit offset of the channel's least significant bit.
    pub offset: u32,
    /// Number of bits the channel occupies.
    pub length: u32,
}

impl ChannelBits {
    /// Scales an 8-bit color component into this channel's field.
    ///
    /// The component's most significant bits are kept, matching how a
    /// truecolor palette entry is packed into a smaller channel.
    #[must_use]
    pub const fn pack(self, component: u8) -> u32 {
        ((component as u32) >> (8 - self.length)) << self.offset
    }
}

/// Channel positions for all three colors of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelLayout {
    /// Red channel position.
    pub red: ChannelBits,
    /// Green channel position.
    pub green: ChannelBits,
    /// Blue channel position.
    pub blue: ChannelBits,
}

/// Framebuffer pixel formats the pipeline can scan out.
///
/// The channel layouts are fixed by the fabric's pixel unpacker and are not
/// negotiable at runtime; [`PixelFormat::channels`] reports them so the
/// display-consumption layer can describe the buffer faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 16-bit pixels, red in the low bits.
    Rgb565,
    /// 16-bit pixels, blue in the low bits.
    Bgr565,
    /// 24-bit pixels, red in the low bits.
    Rgb888,
    /// 24-bit pixels, blue in the low bits.
    Bgr888,
}

impl PixelFormat {
    /// Resolves a configuration format name.
    ///
    /// Names are the lowercase strings used by the platform configuration:
    /// `"rgb565"`, `"bgr565"`, `"rgb888"`, `"bgr888"`.
    ///
    /// # Example
    /// ```
    /// use vdma_display::PixelFormat;
    ///
    /// assert_eq!(PixelFormat::parse("rgb565"), Some(PixelFormat::Rgb565));
    /// assert_eq!(PixelFormat::parse("rgb332"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rgb565" => Some(Self::Rgb565),
            "bgr565" => Some(Self::Bgr565),
            "rgb888" => Some(Self::Rgb888),
            "bgr888" => Some(Self::Bgr888),
            _ => None,
        }
    }

    /// Configuration name of this format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rgb565 => "rgb565",
            Self::Bgr565 => "bgr565",
            Self::Rgb888 => "rgb888",
            Self::Bgr888 => "bgr888",
        }
    }

    /// Bits one pixel occupies in the framebuffer.
    #[must_use]
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Rgb565 | Self::Bgr565 => 16,
            Self::Rgb888 | Self::Bgr888 => 24,
        }
    }

    /// Bytes one pixel occupies in the framebuffer.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel() >> 3
    }

    /// Color depth: the number of bits carrying color information.
    ///
    /// Every supported format is fully packed, so this equals
    /// [`bits_per_pixel`](Self::bits_per_pixel).
    #[must_use]
    pub const fn depth(self) -> u32 {
        let c = self.channels();
        c.red.length + c.green.length + c.blue.length
    }

    /// Channel bit positions of this format.
    #[must_use]
    pub const fn channels(self) -> ChannelLayout {
        const fn bits(offset: u32, length: u32) -> ChannelBits {
            ChannelBits { offset, length }
        }
        match self {
            Self::Rgb565 => ChannelLayout {
                red: bits(0, 5),
                green: bits(5, 6),
                blue: bits(11, 5),
            },
            Self::Bgr565 => ChannelLayout {
                red: bits(11, 5),
                green: bits(5, 6),
                blue: bits(0, 5),
            },
            Self::Rgb888 => ChannelLayout {
                red: bits(0, 8),
                green: bits(8, 8),
                blue: bits(16, 8),
            },
            Self::Bgr888 => ChannelLayout {
                red: bits(16, 8),
                green: bits(8, 8),
                blue: bits(0, 8),
            },
        }
    }

    /// Packs a truecolor value into this format's pixel word.
    ///
    /// # Example
    /// ```
    /// use embedded_graphics::pixelcolor::Rgb888;
    /// use embedded_graphics::prelude::RgbColor;
    /// use vdma_display::PixelFormat;
    ///
    /// // Full red lands in the low five bits of an RGB565 pixel.
    /// assert_eq!(PixelFormat::Rgb565.pack(Rgb888::RED), 0x001F);
    /// ```
    #[must_use]
    pub fn pack(self, color: Rgb888) -> u32 {
        let c = self.channels();
        c.red.pack(color.r()) | c.green.pack(color.g()) | c.blue.pack(color.b())
    }
}

/// A display mode with resolved, clamped geometry.
///
/// Porch and sync lengths are in pixels (horizontal) or lines (vertical).
/// The active area is already clamped into the supported range when the mode
/// is derived from configuration; the orchestrator owns the value for the
/// pipeline's lifetime and every consumer sees the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayMode {
    /// Pixel clock rate in Hz.
    pub pixel_clock_hz: u32,
    /// Active pixels per line.
    pub hactive: u32,
    /// Pixels between active video and HSYNC assertion.
    pub hfront_porch: u32,
    /// HSYNC pulse width in pixels.
    pub hsync_len: u32,
    /// Pixels between HSYNC deassertion and the next active line.
    pub hback_porch: u32,
    /// Active lines per frame.
    pub vactive: u32,
    /// Lines between active video and VSYNC assertion.
    pub vfront_porch: u32,
    /// VSYNC pulse width in lines.
    pub vsync_len: u32,
    /// Lines between VSYNC deassertion and the next active frame.
    pub vback_porch: u32,
    /// HSYNC is active high.
    pub hsync_active_high: bool,
    /// VSYNC is active high.
    pub vsync_active_high: bool,
    /// Data enable is active high.
    pub de_active_high: bool,
    /// Pixel data is driven on the rising clock edge.
    pub pixclk_rising: bool,
}

impl DisplayMode {
    /// Total pixels per line including blanking.
    #[must_use]
    pub const fn htotal(&self) -> u32 {
        self.hactive + self.hfront_porch + self.hsync_len + self.hback_porch
    }

    /// Total lines per frame including blanking.
    #[must_use]
    pub const fn vtotal(&self) -> u32 {
        self.vactive + self.vfront_porch + self.vsync_len + self.vback_porch
    }

    /// Pixel count at which HSYNC asserts.
    #[must_use]
    pub const fn hsync_start(&self) -> u32 {
        self.hactive + self.hfront_porch
    }

    /// Pixel count at which HSYNC deasserts.
    #[must_use]
    pub const fn hsync_end(&self) -> u32 {
        self.hsync_start() + self.hsync_len
    }

    /// Line count at which VSYNC asserts.
    #[must_use]
    pub const fn vsync_start(&self) -> u32 {
        self.vactive + self.vfront_porch
    }

    /// Line count at which VSYNC deasserts.
    #[must_use]
    pub const fn vsync_end(&self) -> u32 {
        self.vsync_start() + self.vsync_len
    }

    /// Vertical refresh rate in Hz, rounded to the nearest integer.
    #[must_use]
    pub const fn refresh_hz(&self) -> u32 {
        let total = self.htotal() * self.vtotal();
        if total == 0 {
            return 0;
        }
        (self.pixel_clock_hz + total / 2) / total
    }

    /// Bytes per framebuffer line for the given pixel format.
    #[must_use]
    pub const fn line_length(&self, format: PixelFormat) -> u32 {
        self.hactive * format.bytes_per_pixel()
    }

    /// Framebuffer allocation size for this mode.
    ///
    /// Sized at four bytes per pixel regardless of the active format, rounded
    /// up to the allocator's page size.
    #[must_use]
    pub const fn frame_bytes(&self, page_size: usize) -> usize {
        align_up(self.hactive as usize * self.vactive as usize * 4, page_size)
    }
}

/// Hardware resources the pipeline claims during bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    /// The pixel clock feeding the timing generator.
    PixelClock,
    /// The streaming DMA channel named in the configuration.
    DmaChannel,
    /// The panel's reset and serial GPIO lines.
    PanelLines,
}

/// Hardware blocks that can refuse a configuration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Block {
    /// The video timing controller.
    Vtc,
    /// The streaming DMA engine.
    Dma,
    /// The display-registration layer.
    Sink,
}

/// Why a pipeline operation failed.
///
/// `E` is the error type of the platform's panel GPIO lines and defaults to
/// [`Infallible`]; capability adapters never produce the [`Error::Panel`]
/// variant and can return `Error` with the default parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E = Infallible> {
    /// The configuration names a pixel format outside the supported set.
    UnknownFormat,
    /// The configuration's mode timing is missing or inconsistent.
    InvalidMode,
    /// A required resource is busy or absent.
    Unavailable(Resource),
    /// The platform allocator could not provide the framebuffer region.
    OutOfMemory,
    /// A hardware block refused a configuration call.
    Rejected(Block),
    /// A panel control line could not be driven.
    Panel(E),
}

impl Error<Infallible> {
    /// Re-types a capability error for a pipeline generic over panel lines.
    #[must_use]
    pub fn widen<E>(self) -> Error<E> {
        match self {
            Self::UnknownFormat => Error::UnknownFormat,
            Self::InvalidMode => Error::InvalidMode,
            Self::Unavailable(resource) => Error::Unavailable(resource),
            Self::OutOfMemory => Error::OutOfMemory,
            Self::Rejected(block) => Error::Rejected(block),
            Self::Panel(never) => match never {},
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat => f.write_str("unknown pixel format name"),
            Self::InvalidMode => f.write_str("invalid mode timing"),
            Self::Unavailable(Resource::PixelClock) => f.write_str("pixel clock unavailable"),
            Self::Unavailable(Resource::DmaChannel) => f.write_str("dma channel unavailable"),
            Self::Unavailable(Resource::PanelLines) => f.write_str("panel gpio lines unavailable"),
            Self::OutOfMemory => f.write_str("framebuffer allocation failed"),
            Self::Rejected(Block::Vtc) => f.write_str("timing controller rejected configuration"),
            Self::Rejected(Block::Dma) => f.write_str("dma engine rejected configuration"),
            Self::Rejected(Block::Sink) => f.write_str("display registration rejected"),
            Self::Panel(_) => f.write_str("panel control line fault"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;
    use std::string::ToString;

    use super::*;
    use embedded_graphics::pixelcolor::Rgb888;

    fn reference_mode() -> DisplayMode {
        DisplayMode {
            pixel_clock_hz: 33_260_000,
            hactive: 480,
            hfront_porch: 10,
            hsync_len: 2,
            hback_porch: 33,
            vactive: 800,
            vfront_porch: 40,
            vsync_len: 128,
            vback_porch: 88,
            hsync_active_high: false,
            vsync_active_high: false,
            de_active_high: true,
            pixclk_rising: true,
        }
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4096), 0);
        assert_eq!(align_up(1, 4096), 4096);
        assert_eq!(align_up(4096, 4096), 4096);
        assert_eq!(align_up(4097, 4096), 8192);

        // The reference 480x800 frame is already page sized.
        assert_eq!(align_up(480 * 800 * 4, 4096), 1_536_000);
    }

    #[test]
    fn test_clamp_active_width() {
        assert_eq!(clamp_active_width(0), 480);
        assert_eq!(clamp_active_width(479), 480);
        assert_eq!(clamp_active_width(480), 480);
        assert_eq!(clamp_active_width(1024), 1024);
        assert_eq!(clamp_active_width(1920), 1920);
        assert_eq!(clamp_active_width(1921), 1920);
        assert_eq!(clamp_active_width(u32::MAX), 1920);
    }

    #[test]
    fn test_clamp_active_height() {
        assert_eq!(clamp_active_height(0), 272);
        assert_eq!(clamp_active_height(271), 272);
        assert_eq!(clamp_active_height(272), 272);
        assert_eq!(clamp_active_height(800), 800);
        assert_eq!(clamp_active_height(1080), 1080);
        assert_eq!(clamp_active_height(1081), 1080);
    }

    #[test]
    fn test_pixel_format_parse() {
        assert_eq!(PixelFormat::parse("rgb565"), Some(PixelFormat::Rgb565));
        assert_eq!(PixelFormat::parse("bgr565"), Some(PixelFormat::Bgr565));
        assert_eq!(PixelFormat::parse("rgb888"), Some(PixelFormat::Rgb888));
        assert_eq!(PixelFormat::parse("bgr888"), Some(PixelFormat::Bgr888));

        // Only the exact lowercase configuration names resolve.
        assert_eq!(PixelFormat::parse("RGB565"), None);
        assert_eq!(PixelFormat::parse("rgb332"), None);
        assert_eq!(PixelFormat::parse(""), None);
    }

    #[test]
    fn test_pixel_format_names_round_trip() {
        for format in [
            PixelFormat::Rgb565,
            PixelFormat::Bgr565,
            PixelFormat::Rgb888,
            PixelFormat::Bgr888,
        ] {
            assert_eq!(PixelFormat::parse(format.name()), Some(format));
        }
    }

    #[test]
    fn test_pixel_format_table() {
        // The channel table is a hardware contract; check every entry.
        let rgb565 = PixelFormat::Rgb565.channels();
        assert_eq!(PixelFormat::Rgb565.bits_per_pixel(), 16);
        assert_eq!((rgb565.red.offset, rgb565.red.length), (0, 5));
        assert_eq!((rgb565.green.offset, rgb565.green.length), (5, 6));
        assert_eq!((rgb565.blue.offset, rgb565.blue.length), (11, 5));

        let bgr565 = PixelFormat::Bgr565.channels();
        assert_eq!(PixelFormat::Bgr565.bits_per_pixel(), 16);
        assert_eq!((bgr565.red.offset, bgr565.red.length), (11, 5));
        assert_eq!((bgr565.green.offset, bgr565.green.length), (5, 6));
        assert_eq!((bgr565.blue.offset, bgr565.blue.length), (0, 5));

        let rgb888 = PixelFormat::Rgb888.channels();
        assert_eq!(PixelFormat::Rgb888.bits_per_pixel(), 24);
        assert_eq!((rgb888.red.offset, rgb888.red.length), (0, 8));
        assert_eq!((rgb888.green.offset, rgb888.green.length), (8, 8));
        assert_eq!((rgb888.blue.offset, rgb888.blue.length), (16, 8));

        let bgr888 = PixelFormat::Bgr888.channels();
        assert_eq!(PixelFormat::Bgr888.bits_per_pixel(), 24);
        assert_eq!((bgr888.red.offset, bgr888.red.length), (16, 8));
        assert_eq!((bgr888.green.offset, bgr888.green.length), (8, 8));
        assert_eq!((bgr888.blue.offset, bgr888.blue.length), (0, 8));
    }

    #[test]
    fn test_pixel_format_depth_matches_bpp() {
        // All supported formats are fully packed.
        for format in [
            PixelFormat::Rgb565,
            PixelFormat::Bgr565,
            PixelFormat::Rgb888,
            PixelFormat::Bgr888,
        ] {
            assert_eq!(format.depth(), format.bits_per_pixel());
            assert_eq!(format.bytes_per_pixel(), format.bits_per_pixel() / 8);
        }
    }

    #[test]
    fn test_channel_pack() {
        let five = ChannelBits { offset: 11, length: 5 };
        assert_eq!(five.pack(0xFF), 0x1F << 11);
        assert_eq!(five.pack(0x00), 0);
        // Only the top five bits of the component survive.
        assert_eq!(five.pack(0x08), 1 << 11);

        let eight = ChannelBits { offset: 8, length: 8 };
        assert_eq!(eight.pack(0xA5), 0xA5 << 8);
    }

    #[test]
    fn test_pack_primaries() {
        assert_eq!(PixelFormat::Rgb565.pack(Rgb888::RED), 0x001F);
        assert_eq!(PixelFormat::Rgb565.pack(Rgb888::GREEN), 0x3F << 5);
        assert_eq!(PixelFormat::Rgb565.pack(Rgb888::BLUE), 0x1F << 11);
        assert_eq!(PixelFormat::Rgb565.pack(Rgb888::WHITE), 0xFFFF);
        assert_eq!(PixelFormat::Rgb565.pack(Rgb888::BLACK), 0x0000);

        assert_eq!(PixelFormat::Bgr565.pack(Rgb888::RED), 0x1F << 11);
        assert_eq!(PixelFormat::Bgr565.pack(Rgb888::BLUE), 0x001F);

        assert_eq!(PixelFormat::Rgb888.pack(Rgb888::RED), 0x0000_00FF);
        assert_eq!(PixelFormat::Rgb888.pack(Rgb888::BLUE), 0x00FF_0000);
        assert_eq!(PixelFormat::Bgr888.pack(Rgb888::RED), 0x00FF_0000);
        assert_eq!(PixelFormat::Bgr888.pack(Rgb888::WHITE), 0x00FF_FFFF);
    }

    #[test]
    fn test_display_mode_totals() {
        let mode = reference_mode();
        assert_eq!(mode.htotal(), 525);
        assert_eq!(mode.vtotal(), 1056);
        assert_eq!(mode.hsync_start(), 490);
        assert_eq!(mode.hsync_end(), 492);
        assert_eq!(mode.vsync_start(), 840);
        assert_eq!(mode.vsync_end(), 968);
    }

    #[test]
    fn test_display_mode_refresh() {
        let mode = reference_mode();
        // 33.26 MHz over 525x1056 totals lands on 60 Hz.
        assert_eq!(mode.refresh_hz(), 60);

        let zero = DisplayMode {
            pixel_clock_hz: 0,
            hactive: 0,
            hfront_porch: 0,
            hsync_len: 0,
            hback_porch: 0,
            vactive: 0,
            vfront_porch: 0,
            vsync_len: 0,
            vback_porch: 0,
            hsync_active_high: false,
            vsync_active_high: false,
            de_active_high: false,
            pixclk_rising: false,
        };
        assert_eq!(zero.refresh_hz(), 0);
    }

    #[test]
    fn test_display_mode_line_length() {
        let mode = reference_mode();
        assert_eq!(mode.line_length(PixelFormat::Rgb565), 960);
        assert_eq!(mode.line_length(PixelFormat::Rgb888), 1440);
    }

    #[test]
    fn test_display_mode_frame_bytes() {
        let mode = reference_mode();
        assert_eq!(mode.frame_bytes(4096), 1_536_000);

        let mut odd = mode;
        odd.hactive = 481;
        // 481*800*4 = 1_539_200, next page boundary is 1_540_096.
        assert_eq!(odd.frame_bytes(4096), 1_540_096);
    }

    #[test]
    fn test_error_widen() {
        let narrow: Error = Error::Unavailable(Resource::DmaChannel);
        let wide: Error<u8> = narrow.widen();
        assert_eq!(wide, Error::Unavailable(Resource::DmaChannel));

        let rejected: Error = Error::Rejected(Block::Vtc);
        assert_eq!(rejected.widen::<u8>(), Error::Rejected(Block::Vtc));
    }

    #[test]
    fn test_error_display() {
        let e: Error = Error::UnknownFormat;
        assert_eq!(e.to_string(), "unknown pixel format name");
        let e: Error = Error::Rejected(Block::Dma);
        assert_eq!(e.to_string(), "dma engine rejected configuration");
        let e: Error<u8> = Error::Panel(7);
        assert_eq!(e.to_string(), "panel control line fault");
    }

    #[test]
    fn test_error_debug() {
        let e: Error = Error::OutOfMemory;
        assert_eq!(format!("{e:?}"), "OutOfMemory");
    }
}
