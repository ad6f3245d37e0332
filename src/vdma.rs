//! Streaming DMA programming for the video path.
//!
//! The video DMA engine consumes one *interleaved* descriptor per frame: a
//! two-dimensional transfer of `lines` segments of `line_len` bytes each,
//! read from an incrementing source address and pushed into the fixed
//! fabric stream port. With the channel in auto-repeat (park) mode the
//! engine restarts the same descriptor on every frame boundary, so a
//! single [`FrameDescriptor`] keeps the panel refreshed forever without
//! host involvement.
//!
//! [`VideoStream`] wraps a claimed channel with the verb order the engine
//! requires: flush whatever a previous owner left running before
//! programming, and prepare, then select auto-repeat, then issue.

use crate::hal::{DmaChannel, DmaProvider};
use crate::{DisplayMode, Error, PixelFormat};

/// One frame's interleaved transfer, in the engine's own terms.
///
/// `frame_size` counts interleaved frames per descriptor and `gap` is the
/// inter-segment stride padding; the video path always uses one frame with
/// no gap, reading line after line of a packed framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameDescriptor {
    /// Bus address the engine starts reading from.
    pub src_start: u64,
    /// Bytes in one scanline segment.
    pub line_len: u32,
    /// Scanline segments per frame.
    pub lines: u32,
    /// Interleaved frames per descriptor, always 1 for the video path.
    pub frame_size: u32,
    /// Bytes skipped between segments, always 0 for a packed framebuffer.
    pub gap: u32,
    /// The source address walks forward through memory.
    pub src_incrementing: bool,
    /// The destination is a fixed stream port, not memory.
    pub dst_incrementing: bool,
}

impl FrameDescriptor {
    /// Builds the descriptor that scans one framebuffer out as `mode`'s
    /// active area in `format`.
    #[must_use]
    pub const fn for_mode(mode: &DisplayMode, format: PixelFormat, src_start: u64) -> Self {
        Self {
            src_start,
            line_len: mode.line_length(format),
            lines: mode.vactive,
            frame_size: 1,
            gap: 0,
            src_incrementing: true,
            dst_incrementing: false,
        }
    }

    /// Bytes the engine reads per frame.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        self.line_len as usize * self.lines as usize
    }
}

/// A claimed DMA channel carrying the pipeline's pixel stream.
///
/// Dropping the stream releases the channel back to the platform; call
/// [`halt`](Self::halt) first when the engine may still be running.
#[derive(Debug)]
pub struct VideoStream<C> {
    channel: C,
}

impl<C: DmaChannel> VideoStream<C> {
    /// Claims the named channel and flushes any transfer a previous owner
    /// left behind.
    ///
    /// # Errors
    /// [`Error::Unavailable`] when the platform cannot provide the channel;
    /// the flush failure is forwarded as-is (the channel is released
    /// again in that case).
    pub fn acquire<P>(provider: &mut P, name: &str) -> Result<Self, Error>
    where
        P: DmaProvider<Channel = C>,
    {
        let mut channel = provider.request(name)?;
        channel.terminate()?;
        Ok(Self { channel })
    }

    /// Programs `descriptor` and starts perpetual scan-out.
    ///
    /// The engine re-arms itself on every frame boundary afterwards; the
    /// host never touches the channel again until teardown.
    ///
    /// # Errors
    /// Forwards the first engine fault; nothing later in the verb order is
    /// attempted.
    pub fn arm(&mut self, descriptor: &FrameDescriptor) -> Result<(), Error> {
        self.channel.prepare(descriptor)?;
        self.channel.set_repeat(true)?;
        self.channel.issue()
    }

    /// Stops scan-out, best effort.
    ///
    /// Teardown must keep going whatever the engine answers, so the
    /// terminate fault is swallowed here.
    pub fn halt(&mut self) {
        let _ = self.channel.terminate();
    }
}
