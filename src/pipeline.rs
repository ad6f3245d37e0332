//! Bring-up orchestration and lifetime management for one display pipeline.
//!
//! [`Pipeline::bring_up`] walks the hardware from cold to streaming in a
//! fixed order: resolve and validate the configuration, allocate and zero
//! the framebuffer, start the pixel clock, program and start the timing
//! generator, initialize the panel (unless the sink is a pass-through
//! digital receiver), arm the DMA engine in auto-repeat mode, and finally
//! register the framebuffer with the display-consumption layer. The
//! returned [`Pipeline`] owns every claimed resource until it is torn down
//! or dropped.
//!
//! A failure at any step unwinds the steps already completed before the
//! error is returned, so a pipeline either reaches [`State::Registered`]
//! or leaves the platform exactly as it found it. Unwinding and teardown
//! share one order: deregister first, then stop the timing generator and
//! the pixel clock, then halt and release the DMA channel, then free the
//! framebuffer. Stopping sync generation before the pixel source goes away
//! keeps the sink from latching a frame with dead data lines.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::hal::{
    DisplaySink, DmaProvider, FrameMemory, FrameRegion, FramebufferInfo, PixelClock, RegisterBus,
};
use crate::ili9806e;
use crate::serial::CommandPort;
use crate::vdma::{FrameDescriptor, VideoStream};
use crate::vtc::{self, Vtc};
use crate::{clamp_active_height, clamp_active_width, DisplayMode, Error, PixelFormat, Resource};

/// Milliseconds the pixel clock is given to lock after enabling.
pub const CLOCK_SETTLE_MS: u32 = 50;
/// Milliseconds the sync signals are given to stabilize before the panel
/// is brought up behind them.
pub const TIMING_SETTLE_MS: u32 = 50;

/// The hardware capabilities one platform provides, as a type bundle.
///
/// Implemented once per host platform on an empty marker type; the
/// associated types say which concrete driver backs each capability.
pub trait Platform {
    /// Pixel clock feeding the timing generator.
    type Clock: PixelClock;
    /// Register bus of the timing generator.
    type Bus: RegisterBus;
    /// Streaming DMA engine.
    type Dma: DmaProvider;
    /// DMA-capable framebuffer allocator.
    type Memory: FrameMemory;
    /// Display-consumption layer the finished framebuffer registers with.
    type Sink: DisplaySink;
    /// GPIO line type of the panel's reset, serial and backlight pins.
    type Pin: OutputPin;
    /// Settle-delay provider.
    type Delay: DelayNs;
}

/// Error type of a platform's panel GPIO lines.
pub type LineError<P> = <<P as Platform>::Pin as ErrorType>::Error;

type ChannelOf<P> = <<P as Platform>::Dma as DmaProvider>::Channel;

/// The panel's control lines, claimed and driven high by the host.
pub struct PanelIo<Pin> {
    /// Hardware reset, active low.
    pub reset: Pin,
    /// Serial chip select, active low.
    pub select: Pin,
    /// Serial clock.
    pub clock: Pin,
    /// Serial data out.
    pub data: Pin,
    /// Backlight enable, driven high once the panel shows valid video.
    pub backlight: Option<Pin>,
}

/// Everything [`Pipeline::bring_up`] consumes.
///
/// The panel lines are optional; they must be present unless the
/// configuration selects a digital sink.
pub struct Parts<P: Platform> {
    /// Pixel clock, claimed but not yet running.
    pub clock: P::Clock,
    /// Timing generator register bus.
    pub vtc_bus: P::Bus,
    /// DMA engine access.
    pub dma: P::Dma,
    /// Framebuffer allocator.
    pub memory: P::Memory,
    /// Display-consumption layer.
    pub sink: P::Sink,
    /// Panel control lines, when an LCD hangs off the pipeline.
    pub panel: Option<PanelIo<P::Pin>>,
    /// Settle-delay provider.
    pub delay: P::Delay,
}

/// Raw mode timing as configuration supplies it.
///
/// The same fields as [`DisplayMode`] with the clock in kHz, before
/// validation and clamping. [`to_mode`](Self::to_mode) turns it into the
/// resolved form the rest of the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeTiming {
    /// Pixel clock rate in kHz.
    pub pixel_clock_khz: u32,
    /// Requested active pixels per line.
    pub hactive: u32,
    /// Horizontal front porch in pixels.
    pub hfront_porch: u32,
    /// HSYNC pulse width in pixels.
    pub hsync_len: u32,
    /// Horizontal back porch in pixels.
    pub hback_porch: u32,
    /// Requested active lines per frame.
    pub vactive: u32,
    /// Vertical front porch in lines.
    pub vfront_porch: u32,
    /// VSYNC pulse width in lines.
    pub vsync_len: u32,
    /// Vertical back porch in lines.
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

impl ModeTiming {
    /// Timing of the stock 480x800 portrait panel: 33.26 MHz pixel clock,
    /// 60 Hz refresh, syncs active low.
    pub const WVGA_480X800: Self = Self {
        pixel_clock_khz: 33_260,
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
    };

    /// Validates the timing and resolves it into a [`DisplayMode`].
    ///
    /// The active area is clamped into the supported range; the blanking
    /// intervals are taken as given and checked against the timing
    /// generator's counter width.
    ///
    /// # Errors
    /// [`Error::InvalidMode`] when the clock rate or an active dimension
    /// is zero, a total overflows, or a total exceeds what the generator
    /// can count.
    pub fn to_mode(&self) -> Result<DisplayMode, Error> {
        if self.pixel_clock_khz == 0 || self.hactive == 0 || self.vactive == 0 {
            return Err(Error::InvalidMode);
        }
        let hactive = clamp_active_width(self.hactive);
        let vactive = clamp_active_height(self.vactive);
        let htotal = self
            .hfront_porch
            .checked_add(self.hsync_len)
            .and_then(|blank| blank.checked_add(self.hback_porch))
            .and_then(|blank| blank.checked_add(hactive))
            .ok_or(Error::InvalidMode)?;
        let vtotal = self
            .vfront_porch
            .checked_add(self.vsync_len)
            .and_then(|blank| blank.checked_add(self.vback_porch))
            .and_then(|blank| blank.checked_add(vactive))
            .ok_or(Error::InvalidMode)?;
        if htotal > vtc::MAX_TOTAL || vtotal > vtc::MAX_TOTAL {
            return Err(Error::InvalidMode);
        }
        Ok(DisplayMode {
            pixel_clock_hz: self.pixel_clock_khz.saturating_mul(1000),
            hactive,
            hfront_porch: self.hfront_porch,
            hsync_len: self.hsync_len,
            hback_porch: self.hback_porch,
            vactive,
            vfront_porch: self.vfront_porch,
            vsync_len: self.vsync_len,
            vback_porch: self.vback_porch,
            hsync_active_high: self.hsync_active_high,
            vsync_active_high: self.vsync_active_high,
            de_active_high: self.de_active_high,
            pixclk_rising: self.pixclk_rising,
        })
    }
}

/// One pipeline's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config<'a> {
    /// Framebuffer pixel format name, e.g. `"rgb565"`.
    pub pixel_format: &'a str,
    /// Mode timing to program.
    pub timing: ModeTiming,
    /// Platform name of the DMA channel to claim.
    pub dma_channel: &'a str,
    /// The sink is a pass-through digital receiver; skip panel bring-up.
    pub digital_sink: bool,
}

/// How far a pipeline has come.
///
/// Ordered by progress; unwinding consults the order to know which blocks
/// are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Nothing claimed beyond the framebuffer.
    Uninitialized,
    /// Pixel clock running.
    ClockConfigured,
    /// Timing generator running.
    TimingConfigured,
    /// Panel reset and initialized, backlight on.
    PanelInitialized,
    /// DMA engine streaming the framebuffer.
    Streaming,
    /// Framebuffer registered with the sink; fully operational.
    Registered,
    /// Torn down; every resource released.
    TornDown,
}

/// A display pipeline, from framebuffer memory to the panel glass.
///
/// Built by [`bring_up`](Self::bring_up); dropping it tears the hardware
/// down in the documented order.
pub struct Pipeline<P: Platform> {
    clock: P::Clock,
    vtc: Vtc<P::Bus>,
    dma: P::Dma,
    stream: Option<VideoStream<ChannelOf<P>>>,
    memory: P::Memory,
    sink: P::Sink,
    region: Option<FrameRegion>,
    panel: Option<PanelIo<P::Pin>>,
    delay: P::Delay,
    mode: DisplayMode,
    format: PixelFormat,
    info: FramebufferInfo,
    state: State,
}

impl<P: Platform> Pipeline<P> {
    /// Brings the whole pipeline up and returns it streaming.
    ///
    /// On failure every step already completed is unwound and the parts
    /// are dropped, releasing whatever the host's types release on drop.
    ///
    /// # Errors
    /// - [`Error::UnknownFormat`] / [`Error::InvalidMode`] for a
    ///   configuration that names no supported format or timing
    /// - [`Error::Unavailable`] when the panel lines are missing, or the
    ///   clock or DMA channel cannot be claimed
    /// - [`Error::OutOfMemory`] when the framebuffer allocation fails
    /// - [`Error::Rejected`] when the timing generator, the DMA engine or
    ///   the sink refuses a configuration call
    /// - [`Error::Panel`] carrying the line fault when a panel GPIO
    ///   cannot be driven
    pub fn bring_up(parts: Parts<P>, config: &Config<'_>) -> Result<Self, Error<LineError<P>>> {
        let format = PixelFormat::parse(config.pixel_format).ok_or(Error::UnknownFormat)?;
        let mode = config.timing.to_mode().map_err(Error::widen)?;
        let Parts {
            clock,
            vtc_bus,
            dma,
            memory,
            sink,
            panel,
            delay,
        } = parts;
        if !config.digital_sink && panel.is_none() {
            return Err(Error::Unavailable(Resource::PanelLines));
        }

        let mut pipeline = Self {
            clock,
            vtc: Vtc::new(vtc_bus),
            dma,
            stream: None,
            memory,
            sink,
            region: None,
            panel,
            delay,
            mode,
            format,
            info: FramebufferInfo {
                width: mode.hactive,
                height: mode.vactive,
                stride: mode.line_length(format),
                format,
                channels: format.channels(),
                device_address: 0,
                len: 0,
            },
            state: State::Uninitialized,
        };

        match pipeline.engage(config) {
            Ok(()) => Ok(pipeline),
            Err(e) => {
                pipeline.tear_down();
                Err(e)
            }
        }
    }

    /// The bring-up sequence proper. `self.state` tracks which blocks are
    /// live so [`tear_down`](Self::tear_down) can unwind a partial run.
    fn engage(&mut self, config: &Config<'_>) -> Result<(), Error<LineError<P>>> {
        let len = self.mode.frame_bytes(self.memory.page_size());
        let mut region = self.memory.alloc(len).map_err(Error::widen)?;
        region.as_mut_slice().fill(0);
        let device_address = region.device_address();
        self.info.device_address = device_address;
        self.info.len = region.len();
        self.region = Some(region);

        self.clock
            .set_rate(self.mode.pixel_clock_hz)
            .map_err(Error::widen)?;
        self.clock.enable().map_err(Error::widen)?;
        self.state = State::ClockConfigured;
        self.delay.delay_ms(CLOCK_SETTLE_MS);

        self.vtc.reset().map_err(Error::widen)?;
        self.vtc.disable().map_err(Error::widen)?;
        self.vtc.configure(&self.mode).map_err(Error::widen)?;
        self.vtc.enable().map_err(Error::widen)?;
        self.state = State::TimingConfigured;
        self.delay.delay_ms(TIMING_SETTLE_MS);

        if !config.digital_sink {
            // Presence was checked before any hardware was touched.
            if let Some(io) = self.panel.take() {
                let io = init_panel(io, &mut self.delay).map_err(Error::Panel)?;
                self.panel = Some(io);
                self.state = State::PanelInitialized;
            }
        }

        self.stream = Some(
            VideoStream::acquire(&mut self.dma, config.dma_channel).map_err(Error::widen)?,
        );
        let descriptor = FrameDescriptor::for_mode(&self.mode, self.format, device_address);
        if let Some(stream) = self.stream.as_mut() {
            stream.arm(&descriptor).map_err(Error::widen)?;
        }
        self.state = State::Streaming;

        self.sink.register(&self.info).map_err(Error::widen)?;
        self.state = State::Registered;
        Ok(())
    }

    /// Stops and releases everything, in the documented order.
    ///
    /// Idempotent; also runs on drop. After teardown the pipeline only
    /// answers state queries.
    pub fn tear_down(&mut self) {
        if self.state == State::TornDown {
            return;
        }
        if self.state == State::Registered {
            self.sink.unregister();
        }
        if self.state >= State::TimingConfigured {
            let _ = self.vtc.disable();
        }
        if self.state >= State::ClockConfigured {
            self.clock.disable();
        }
        if let Some(mut stream) = self.stream.take() {
            stream.halt();
        }
        if let Some(region) = self.region.take() {
            self.memory.free(region);
        }
        self.state = State::TornDown;
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// The resolved display mode this pipeline runs.
    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// The framebuffer pixel format.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// The descriptor handed to the display-consumption layer.
    #[must_use]
    pub const fn framebuffer_info(&self) -> FramebufferInfo {
        self.info
    }

    /// Mutable view of the pixel memory the engine is scanning out.
    ///
    /// Empty once the pipeline is torn down.
    pub fn frame_mut(&mut self) -> &mut [u8] {
        match self.region.as_mut() {
            Some(region) => region.as_mut_slice(),
            None => &mut [],
        }
    }
}

impl<P: Platform> fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Drop for Pipeline<P> {
    fn drop(&mut self) {
        self.tear_down();
    }
}

/// Resets and initializes the panel over its serial port, then turns the
/// backlight on. Returns the lines for the pipeline to keep.
fn init_panel<Pin, D, E>(io: PanelIo<Pin>, delay: &mut D) -> Result<PanelIo<Pin>, E>
where
    Pin: OutputPin<Error = E>,
    D: DelayNs,
{
    let PanelIo {
        mut reset,
        select,
        clock,
        data,
        mut backlight,
    } = io;
    let mut port = CommandPort::new(select, clock, data);
    ili9806e::initialize(&mut port, &mut reset, delay)?;
    if let Some(light) = backlight.as_mut() {
        light.set_high()?;
    }
    let (select, clock, data) = port.release();
    Ok(PanelIo {
        reset,
        select,
        clock,
        data,
        backlight,
    })
}
