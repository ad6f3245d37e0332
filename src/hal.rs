//! Host platform capability interfaces.
//!
//! The pipeline never talks to hardware directly; every touchpoint is a small
//! trait the host platform implements once. The traits are deliberately
//! narrow: they carry exactly the verbs the bring-up sequence needs and
//! nothing the display-consumption layer might want for itself.
//!
//! Capability adapters report failures through the crate [`Error`] taxonomy
//! with its default (never-type) panel parameter: an adapter that cannot
//! claim a clock returns [`Error::Unavailable`], one whose hardware refuses a
//! register write returns [`Error::Rejected`], and so on. Which variant fits
//! is documented per method.
//!
//! # Safety
//! [`FrameMemory`] is an `unsafe` trait: the pipeline turns the regions it
//! returns into byte slices and hands their device address to the DMA engine,
//! so an implementation that returns aliased, undersized, or unmapped regions
//! causes undefined behavior without any further `unsafe` on the caller's
//! side.

use core::ptr::NonNull;

use embedded_dma::ReadBuffer;

use crate::vdma::FrameDescriptor;
use crate::{ChannelLayout, Error, PixelFormat};

/// Default allocation granule for [`FrameMemory::page_size`].
pub const PAGE_SIZE: usize = 4096;

/// The pixel clock feeding the timing generator.
///
/// Rate changes only happen while the pipeline is being brought up or torn
/// down; the clock is never reprogrammed while the DMA engine is streaming.
pub trait PixelClock {
    /// Programs the clock to `rate_hz`.
    ///
    /// # Errors
    /// [`Error::Unavailable`] with [`Resource::PixelClock`] when the clock
    /// cannot be claimed, [`Error::Rejected`] when the rate is outside what
    /// the clock tree can synthesize.
    ///
    /// [`Resource::PixelClock`]: crate::Resource::PixelClock
    fn set_rate(&mut self, rate_hz: u32) -> Result<(), Error>;

    /// Ungates the clock output.
    ///
    /// # Errors
    /// [`Error::Unavailable`] with [`Resource::PixelClock`] when enabling
    /// fails.
    ///
    /// [`Resource::PixelClock`]: crate::Resource::PixelClock
    fn enable(&mut self) -> Result<(), Error>;

    /// Gates the clock output. Infallible, called on every teardown path.
    fn disable(&mut self);
}

/// Write access to a memory-mapped register block.
///
/// `offset` is a byte offset from the block's base address. The pipeline
/// only ever writes timing-generator registers; no read path is needed
/// because the adapter shadows the one read-modify-write register itself.
pub trait RegisterBus {
    /// Writes one 32-bit register.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Vtc`] when the bus or the block
    /// refuses the write.
    ///
    /// [`Block::Vtc`]: crate::Block::Vtc
    fn write(&mut self, offset: u32, value: u32) -> Result<(), Error>;
}

/// One claimed streaming DMA channel.
///
/// Ownership of the value is ownership of the channel: implementations
/// release the underlying channel when dropped. The verbs mirror the
/// bring-up sequence; no completion-wait verb exists because a parked
/// channel never completes.
pub trait DmaChannel {
    /// Cancels any in-flight work on the channel.
    ///
    /// Called once right after the channel is claimed, because an earlier
    /// boot stage may have left a transfer running, and again on teardown.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Dma`] when the engine refuses the
    /// terminate request.
    ///
    /// [`Block::Dma`]: crate::Block::Dma
    fn terminate(&mut self) -> Result<(), Error>;

    /// Builds the engine's transfer program from an interleaved descriptor.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Dma`] when the descriptor cannot be
    /// expressed by the engine.
    ///
    /// [`Block::Dma`]: crate::Block::Dma
    fn prepare(&mut self, descriptor: &FrameDescriptor) -> Result<(), Error>;

    /// Switches frame auto-repeat (park mode) on or off.
    ///
    /// With repeat enabled the engine re-transfers the prepared frame on
    /// every frame boundary without host involvement.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Dma`] when the engine refuses the
    /// configuration.
    ///
    /// [`Block::Dma`]: crate::Block::Dma
    fn set_repeat(&mut self, repeat: bool) -> Result<(), Error>;

    /// Enqueues the prepared transfer and starts the engine.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Dma`] when submission fails.
    ///
    /// [`Block::Dma`]: crate::Block::Dma
    fn issue(&mut self) -> Result<(), Error>;
}

/// Hands out streaming DMA channels by configuration name.
pub trait DmaProvider {
    /// Channel type this provider hands out.
    type Channel: DmaChannel;

    /// Claims the channel registered under `name`.
    ///
    /// # Errors
    /// [`Error::Unavailable`] with [`Resource::DmaChannel`] when no channel
    /// of that name exists or it is already claimed.
    ///
    /// [`Resource::DmaChannel`]: crate::Resource::DmaChannel
    fn request(&mut self, name: &str) -> Result<Self::Channel, Error>;
}

/// Allocator for physically contiguous, DMA-reachable framebuffer memory.
///
/// # Safety
/// Implementations must return regions that are valid for reads and writes
/// of `len` bytes through the virtual pointer for as long as the region
/// exists, exclusively owned by the returned [`FrameRegion`], and mapped at
/// the stated device address for the DMA engine. Returned memory need not be
/// zeroed; the pipeline clears it itself.
pub unsafe trait FrameMemory {
    /// Allocates a region of at least `len` bytes.
    ///
    /// # Errors
    /// [`Error::OutOfMemory`] when no contiguous region of that size exists.
    fn alloc(&mut self, len: usize) -> Result<FrameRegion, Error>;

    /// Returns a region to the allocator.
    fn free(&mut self, region: FrameRegion);

    /// Allocation granule used to round framebuffer sizes up.
    fn page_size(&self) -> usize {
        PAGE_SIZE
    }
}

/// The display-consumption layer the finished pipeline is published to.
///
/// This is the seam between the two historical flavors of this driver: a
/// framebuffer-device backend and a display-framework encoder backend both
/// fit behind it, and the rest of the pipeline cannot tell them apart.
pub trait DisplaySink {
    /// Publishes a scanned-out framebuffer to consumers.
    ///
    /// # Errors
    /// [`Error::Rejected`] with [`Block::Sink`] when the layer refuses the
    /// registration.
    ///
    /// [`Block::Sink`]: crate::Block::Sink
    fn register(&mut self, info: &FramebufferInfo) -> Result<(), Error>;

    /// Withdraws a previously registered framebuffer. Infallible, called on
    /// every teardown path.
    fn unregister(&mut self);
}

/// A physically contiguous framebuffer region.
///
/// Produced by [`FrameMemory::alloc`] and owned by the pipeline until it is
/// handed back through [`FrameMemory::free`]. Carries both views of the
/// memory: the CPU's virtual pointer and the device address the DMA engine
/// reads from.
#[derive(Debug)]
pub struct FrameRegion {
    virt: NonNull<u8>,
    len: usize,
    device_address: u64,
}

impl FrameRegion {
    /// Builds a region from an allocation's raw parts.
    ///
    /// # Safety
    /// `virt` must be valid for reads and writes of `len` bytes for the
    /// region's whole lifetime, exclusively owned by this value, and backed
    /// by physically contiguous memory visible to the DMA engine at
    /// `device_address`.
    #[must_use]
    pub const unsafe fn new(virt: NonNull<u8>, len: usize, device_address: u64) -> Self {
        Self {
            virt,
            len,
            device_address,
        }
    }

    /// Size of the region in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the region is zero sized.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address the DMA engine uses to read the region.
    #[must_use]
    pub const fn device_address(&self) -> u64 {
        self.device_address
    }

    /// CPU view of the region.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // Validity and exclusivity are the `FrameMemory` contract.
        unsafe { core::slice::from_raw_parts(self.virt.as_ptr().cast_const(), self.len) }
    }

    /// Mutable CPU view of the region.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // Validity and exclusivity are the `FrameMemory` contract.
        unsafe { core::slice::from_raw_parts_mut(self.virt.as_ptr(), self.len) }
    }

    /// Raw parts of the region, for allocators reclaiming it.
    #[must_use]
    pub const fn into_raw_parts(self) -> (NonNull<u8>, usize, u64) {
        (self.virt, self.len, self.device_address)
    }
}

// The region is scanned out by the DMA engine, which reads through the
// device address, not the virtual pointer; for host-buffer engines the
// virtual view is the transfer source.
unsafe impl ReadBuffer for FrameRegion {
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const Self::Word, usize) {
        (self.virt.as_ptr().cast_const(), self.len)
    }
}

/// Everything the display-consumption layer needs to describe a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramebufferInfo {
    /// Active pixels per line.
    pub width: u32,
    /// Active lines per frame.
    pub height: u32,
    /// Bytes per framebuffer line.
    pub stride: u32,
    /// Pixel format scanned out of the buffer.
    pub format: PixelFormat,
    /// Channel bit positions of the format.
    pub channels: ChannelLayout,
    /// Device address of the first pixel.
    pub device_address: u64,
    /// Total size of the allocation in bytes.
    pub len: usize,
}
