//! Channels and signals that connect the pipeline stages.
//!
//! ```text
//!  echo IRQ ──PulseChannel / StampChannel──▶ ranging ──ReadingChannel──▶ presentation
//!  trigger ──────────ping (CycleSignal)──────▶ ranging
//!  trigger ─────────────cycle (CycleSignal, optional gate)─────────────▶ presentation
//! ```
//!
//! Every channel is bounded and uses `CriticalSectionRawMutex`, so the
//! interrupt-priority capture path and the thread-mode tasks can share them.
//! [`Pipeline`] is built once at boot and handed out by `&'static` reference;
//! nothing is re-created while running.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::Duration;

use crate::capture::{CaptureStats, EdgeCapture, StampCapture};
use crate::config::{PING_WAIT, PULSE_QUEUE_DEPTH, READING_QUEUE_DEPTH, STAMP_QUEUE_DEPTH};
use crate::pulse::{EdgeStamp, PulseDuration};
use crate::ranging::{PulseAssembler, PulseSource, Ranger, Reading};

// =============================================================================
// Channel Types
// =============================================================================

/// Finished pulse widths from the capture interrupt.
pub type PulseChannel = Channel<CriticalSectionRawMutex, PulseDuration, PULSE_QUEUE_DEPTH>;
pub type PulseSender<'a> = Sender<'a, CriticalSectionRawMutex, PulseDuration, PULSE_QUEUE_DEPTH>;
pub type PulseReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, PulseDuration, PULSE_QUEUE_DEPTH>;

/// Raw edge timestamps from the capture interrupt.
pub type StampChannel = Channel<CriticalSectionRawMutex, EdgeStamp, STAMP_QUEUE_DEPTH>;
pub type StampSender<'a> = Sender<'a, CriticalSectionRawMutex, EdgeStamp, STAMP_QUEUE_DEPTH>;
pub type StampReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, EdgeStamp, STAMP_QUEUE_DEPTH>;

/// Classified readings for presentation.
pub type ReadingChannel = Channel<CriticalSectionRawMutex, Reading, READING_QUEUE_DEPTH>;
pub type ReadingSender<'a> = Sender<'a, CriticalSectionRawMutex, Reading, READING_QUEUE_DEPTH>;
pub type ReadingReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Reading, READING_QUEUE_DEPTH>;

/// Raised by the trigger after each emitted ping.
pub type CycleSignal = Signal<CriticalSectionRawMutex, ()>;

// =============================================================================
// Pipeline
// =============================================================================

/// All cross-context state of the ranging pipeline.
pub struct Pipeline {
    pub pulses: PulseChannel,
    pub stamps: StampChannel,
    pub readings: ReadingChannel,
    /// Raised as each trigger pulse ends. Starts a ranging cycle.
    pub ping: CycleSignal,
    /// Raised after each trigger pulse. Gates presentation when enabled.
    pub cycle: CycleSignal,
    pub stats: CaptureStats,
}

impl Pipeline {
    pub const fn new() -> Self {
        Self {
            pulses: Channel::new(),
            stamps: Channel::new(),
            readings: Channel::new(),
            ping: Signal::new(),
            cycle: Signal::new(),
            stats: CaptureStats::new(),
        }
    }

    /// Interrupt-side capture that pairs edges itself and sends finished pulses.
    pub fn edge_capture(&self) -> EdgeCapture<'_> { EdgeCapture::new(self.pulses.sender(), &self.stats) }

    /// Interrupt-side capture that forwards every edge timestamp.
    pub fn stamp_capture(&self) -> StampCapture<'_> { StampCapture::new(self.stamps.sender(), &self.stats) }

    /// Ranging stage fed by [`Pipeline::edge_capture`], started by each ping.
    ///
    /// `window` is how long an echo may take after its ping.
    pub fn merged_ranger(
        &self,
        window: Duration,
    ) -> Ranger<'_> {
        Ranger::new(
            PulseSource::Merged(self.pulses.receiver()),
            self.readings.sender(),
            window,
        )
        .with_ping(&self.ping, PING_WAIT)
    }

    /// Ranging stage fed by [`Pipeline::stamp_capture`], started by each ping.
    pub fn stamp_ranger(
        &self,
        window: Duration,
    ) -> Ranger<'_> {
        let assembler = PulseAssembler::new(self.stamps.receiver(), &self.stats);
        Ranger::new(PulseSource::Stamps(assembler), self.readings.sender(), window).with_ping(&self.ping, PING_WAIT)
    }
}

impl Default for Pipeline {
    fn default() -> Self { Self::new() }
}
