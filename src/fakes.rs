//! Recording fakes for every platform capability.
//!
//! All fakes share one [`Log`], so a test can assert cross-subsystem
//! ordering (clock before timing before panel before DMA) from a single
//! event list. Failure injection mirrors how the real platforms fail: a
//! failing call returns its error without logging anything, and whatever
//! was already logged is exactly what reached the hardware.

extern crate std;

use core::ptr::NonNull;

use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use crate::hal::{
    DisplaySink, DmaChannel, DmaProvider, FrameMemory, FrameRegion, FramebufferInfo, PixelClock,
    RegisterBus,
};
use crate::serial::PanelChannel;
use crate::vdma::FrameDescriptor;
use crate::{Block, Error, Resource};

/// Bus address the fake allocator reports for its region.
pub const DEVICE_BASE: u64 = 0x1000_0000;

/// GPIO lines the fakes can stand in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Select,
    Clock,
    Data,
    Reset,
    Backlight,
}

/// Everything the fakes observed, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pin(Line, bool),
    DelayMs(u32),
    Command(u8),
    Data(u8),
    ClockRate(u32),
    ClockEnable,
    ClockDisable,
    BusWrite(u32, u32),
    DmaRequest(String),
    DmaTerminate,
    DmaPrepare(FrameDescriptor),
    DmaRepeat(bool),
    DmaIssue,
    DmaRelease,
    Alloc(usize),
    Free,
    Register(FramebufferInfo),
    Unregister,
}

/// Shared event recorder.
#[derive(Debug, Clone, Default)]
pub struct Log(Rc<core::cell::RefCell<Vec<Event>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Error type shared by the GPIO and panel-channel fakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Recording output pin; construction leaves the line driven high.
pub struct FakePin {
    log: Log,
    line: Line,
    level: bool,
    fail: bool,
}

impl FakePin {
    pub fn new(log: &Log, line: Line) -> Self {
        Self {
            log: log.clone(),
            line,
            level: true,
            fail: false,
        }
    }

    /// A pin whose every drive attempt faults.
    pub fn failing(log: &Log, line: Line) -> Self {
        Self {
            fail: true,
            ..Self::new(log, line)
        }
    }

    /// Level the line currently rests at.
    pub fn level(&self) -> bool {
        self.level
    }

    fn drive(&mut self, level: bool) -> Result<(), PinFault> {
        if self.fail {
            return Err(PinFault);
        }
        self.level = level;
        self.log.push(Event::Pin(self.line, level));
        Ok(())
    }
}

impl ErrorType for FakePin {
    type Error = PinFault;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.drive(true)
    }
}

/// Delay provider that records instead of sleeping.
pub struct FakeDelay {
    log: Log,
}

impl FakeDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayMs(ns / 1_000_000));
    }
}

/// Byte-level panel channel fake, bypassing the wire protocol.
pub struct FakeChannel {
    log: Log,
    ok_remaining: Option<usize>,
}

impl FakeChannel {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            ok_remaining: None,
        }
    }

    /// Accepts `ok` bytes, then faults on every further byte.
    pub fn failing_after(log: &Log, ok: usize) -> Self {
        Self {
            log: log.clone(),
            ok_remaining: Some(ok),
        }
    }

    fn admit(&mut self) -> Result<(), PinFault> {
        match self.ok_remaining.as_mut() {
            Some(0) => Err(PinFault),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl PanelChannel for FakeChannel {
    type Error = PinFault;

    fn send_command(&mut self, byte: u8) -> Result<(), PinFault> {
        self.admit()?;
        self.log.push(Event::Command(byte));
        Ok(())
    }

    fn send_data(&mut self, byte: u8) -> Result<(), PinFault> {
        self.admit()?;
        self.log.push(Event::Data(byte));
        Ok(())
    }
}

/// Pixel clock fake.
pub struct FakeClock {
    log: Log,
    fail_rate: bool,
    fail_enable: bool,
}

impl FakeClock {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_rate: false,
            fail_enable: false,
        }
    }

    pub fn failing_rate(log: &Log) -> Self {
        Self {
            fail_rate: true,
            ..Self::new(log)
        }
    }

    pub fn failing_enable(log: &Log) -> Self {
        Self {
            fail_enable: true,
            ..Self::new(log)
        }
    }
}

impl PixelClock for FakeClock {
    fn set_rate(&mut self, rate_hz: u32) -> Result<(), Error> {
        if self.fail_rate {
            return Err(Error::Unavailable(Resource::PixelClock));
        }
        self.log.push(Event::ClockRate(rate_hz));
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Error> {
        if self.fail_enable {
            return Err(Error::Unavailable(Resource::PixelClock));
        }
        self.log.push(Event::ClockEnable);
        Ok(())
    }

    fn disable(&mut self) {
        self.log.push(Event::ClockDisable);
    }
}

/// Write-only register bus fake.
pub struct FakeBus {
    log: Log,
    fail_at: Option<usize>,
    writes: usize,
}

impl FakeBus {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_at: None,
            writes: 0,
        }
    }

    /// Faults the write with index `at` (counting every attempt from 0);
    /// earlier and later writes succeed.
    pub fn failing_at(log: &Log, at: usize) -> Self {
        Self {
            fail_at: Some(at),
            ..Self::new(log)
        }
    }
}

impl RegisterBus for FakeBus {
    fn write(&mut self, offset: u32, value: u32) -> Result<(), Error> {
        let attempt = self.writes;
        self.writes += 1;
        if self.fail_at == Some(attempt) {
            return Err(Error::Rejected(Block::Vtc));
        }
        self.log.push(Event::BusWrite(offset, value));
        Ok(())
    }
}

/// DMA provider fake handing out [`FakeDmaChannel`]s.
pub struct FakeDma {
    log: Log,
    available: bool,
    fail_prepare: bool,
}

impl FakeDma {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            available: true,
            fail_prepare: false,
        }
    }

    /// A provider with no free channel.
    pub fn unavailable(log: &Log) -> Self {
        Self {
            available: false,
            ..Self::new(log)
        }
    }

    /// Channels whose descriptor programming is refused by the engine.
    pub fn failing_prepare(log: &Log) -> Self {
        Self {
            fail_prepare: true,
            ..Self::new(log)
        }
    }
}

impl DmaProvider for FakeDma {
    type Channel = FakeDmaChannel;

    fn request(&mut self, name: &str) -> Result<FakeDmaChannel, Error> {
        if !self.available {
            return Err(Error::Unavailable(Resource::DmaChannel));
        }
        self.log.push(Event::DmaRequest(String::from(name)));
        Ok(FakeDmaChannel {
            log: self.log.clone(),
            fail_prepare: self.fail_prepare,
        })
    }
}

/// Claimed-channel fake; dropping it records the release.
#[derive(Debug)]
pub struct FakeDmaChannel {
    log: Log,
    fail_prepare: bool,
}

impl DmaChannel for FakeDmaChannel {
    fn terminate(&mut self) -> Result<(), Error> {
        self.log.push(Event::DmaTerminate);
        Ok(())
    }

    fn prepare(&mut self, descriptor: &FrameDescriptor) -> Result<(), Error> {
        if self.fail_prepare {
            return Err(Error::Rejected(Block::Dma));
        }
        self.log.push(Event::DmaPrepare(*descriptor));
        Ok(())
    }

    fn set_repeat(&mut self, repeat: bool) -> Result<(), Error> {
        self.log.push(Event::DmaRepeat(repeat));
        Ok(())
    }

    fn issue(&mut self) -> Result<(), Error> {
        self.log.push(Event::DmaIssue);
        Ok(())
    }
}

impl Drop for FakeDmaChannel {
    fn drop(&mut self) {
        self.log.push(Event::DmaRelease);
    }
}

/// Leaking allocator fake.
///
/// Fresh regions are filled with a poison byte so tests can prove the
/// pipeline zeroes what it hands out.
pub struct FakeMemory {
    log: Log,
    exhausted: bool,
}

impl FakeMemory {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            exhausted: false,
        }
    }

    pub fn exhausted(log: &Log) -> Self {
        Self {
            exhausted: true,
            ..Self::new(log)
        }
    }
}

unsafe impl FrameMemory for FakeMemory {
    fn alloc(&mut self, len: usize) -> Result<FrameRegion, Error> {
        if self.exhausted {
            return Err(Error::OutOfMemory);
        }
        let mut backing = std::vec![0xA5u8; len];
        let virt = NonNull::new(backing.as_mut_ptr()).unwrap();
        core::mem::forget(backing);
        self.log.push(Event::Alloc(len));
        // vec![x; len] allocates capacity == len, reclaimed in free().
        Ok(unsafe { FrameRegion::new(virt, len, DEVICE_BASE) })
    }

    fn free(&mut self, region: FrameRegion) {
        let (virt, len, _) = region.into_raw_parts();
        drop(unsafe { Vec::from_raw_parts(virt.as_ptr(), len, len) });
        self.log.push(Event::Free);
    }
}

/// Display-registration fake.
pub struct FakeSink {
    log: Log,
    reject: bool,
}

impl FakeSink {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            reject: false,
        }
    }

    pub fn rejecting(log: &Log) -> Self {
        Self {
            reject: true,
            ..Self::new(log)
        }
    }
}

impl DisplaySink for FakeSink {
    fn register(&mut self, info: &FramebufferInfo) -> Result<(), Error> {
        if self.reject {
            return Err(Error::Rejected(Block::Sink));
        }
        self.log.push(Event::Register(*info));
        Ok(())
    }

    fn unregister(&mut self) {
        self.log.push(Event::Unregister);
    }
}

/// Reconstructs (framing, byte) frames from recorded pin edges.
///
/// Models the panel controller's shift register: while select is asserted
/// the data level is sampled on every rising clock edge; a frame is
/// emitted when select deasserts after exactly nine samples.
pub fn decode_frames(events: &[Event]) -> Vec<(bool, u8)> {
    let mut frames = Vec::new();
    let mut bits: Vec<bool> = Vec::new();
    let mut select_active = false;
    let mut data = true;
    for event in events {
        match *event {
            Event::Pin(Line::Select, level) => {
                if level {
                    if select_active && bits.len() == 9 {
                        let mut byte = 0u8;
                        for &bit in &bits[1..] {
                            byte = (byte << 1) | u8::from(bit);
                        }
                        frames.push((bits[0], byte));
                    }
                    select_active = false;
                } else {
                    select_active = true;
                    bits.clear();
                }
            }
            Event::Pin(Line::Data, level) => data = level,
            Event::Pin(Line::Clock, true) if select_active => bits.push(data),
            _ => {}
        }
    }
    frames
}
