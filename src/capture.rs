//! Echo edge capture for the interrupt-priority context.
//!
//! Two capture front ends share the same contract: called once per echo
//! transition, they never block and never allocate. Handoff uses
//! `try_send`, which wakes the waiting ranging task through the channel's
//! waker; if the queue is full the sample is dropped and counted.
//!
//! - [`EdgeCapture`]: owns the [`EdgePairer`] and sends finished pulse widths.
//! - [`StampCapture`]: forwards each [`EdgeStamp`] and leaves pairing to the
//!   ranging task.
//!
//! [`capture_echo`] drives either front end from an async echo input. It
//! waits for a rise, then for a fall, so the edge kind always comes from the
//! transition that was awaited and never from a level sampled afterwards.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_time::{Duration, with_timeout};
use embedded_hal_async::digital::Wait;

use crate::pipeline::{PulseSender, StampSender};
use crate::pulse::{Edge, EdgePairer, EdgeStamp, PairOutcome, Timestamp};

// =============================================================================
// Capture Counters
// =============================================================================

/// Lock-free counters written by the capture path, read for diagnostics.
pub struct CaptureStats {
    pulses: AtomicU32,
    spurious: AtomicU32,
    abandoned: AtomicU32,
    anomalies: AtomicU32,
    dropped: AtomicU32,
}

/// Point-in-time copy of [`CaptureStats`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct CaptureCounters {
    /// Rise/fall pairs that produced a pulse width.
    pub pulses: u32,
    /// Falls with no pending rise.
    pub spurious: u32,
    /// Rises dropped before their fall arrived.
    pub abandoned: u32,
    /// Falls not later than their rise.
    pub anomalies: u32,
    /// Samples lost to a full handoff queue.
    pub dropped: u32,
}

impl CaptureStats {
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
            spurious: AtomicU32::new(0),
            abandoned: AtomicU32::new(0),
            anomalies: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Count a pairing outcome. Arming a rise is not counted.
    pub fn record(
        &self,
        outcome: PairOutcome,
    ) {
        let counter = match outcome {
            PairOutcome::Armed => return,
            PairOutcome::Paired(_) => &self.pulses,
            PairOutcome::Abandoned => &self.abandoned,
            PairOutcome::Spurious => &self.spurious,
            PairOutcome::ClockAnomaly => &self.anomalies,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a sample lost to a full queue.
    #[inline]
    pub fn record_dropped(&self) { self.dropped.fetch_add(1, Ordering::Relaxed); }

    pub fn snapshot(&self) -> CaptureCounters {
        CaptureCounters {
            pulses: self.pulses.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for CaptureStats {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Stateful-Merge Capture
// =============================================================================

/// Capture front end that pairs edges in interrupt context.
///
/// The pending rise lives inside this value, which is moved into the
/// interrupt-priority task; no thread can observe it.
pub struct EdgeCapture<'a> {
    pairer: EdgePairer,
    pulses: PulseSender<'a>,
    stats: &'a CaptureStats,
}

impl<'a> EdgeCapture<'a> {
    pub fn new(
        pulses: PulseSender<'a>,
        stats: &'a CaptureStats,
    ) -> Self {
        Self {
            pairer: EdgePairer::new(),
            pulses,
            stats,
        }
    }

    /// Handle one echo transition observed at `at`.
    pub fn on_edge(
        &mut self,
        edge: Edge,
        at: Timestamp,
    ) -> PairOutcome {
        let outcome = self.pairer.on_edge(EdgeStamp { edge, at });
        self.stats.record(outcome);
        if let PairOutcome::Paired(pulse) = outcome
            && self.pulses.try_send(pulse).is_err()
        {
            self.stats.record_dropped();
        }
        outcome
    }

    /// Drop a pending rise whose fall never came.
    pub fn abandon(&mut self) {
        if self.pairer.abandon() {
            self.stats.record(PairOutcome::Abandoned);
        }
    }

    /// Whether a rise is waiting for its fall.
    #[inline]
    pub const fn is_armed(&self) -> bool { self.pairer.is_armed() }
}

// =============================================================================
// Timestamp-Queue Capture
// =============================================================================

/// Capture front end that only timestamps edges.
pub struct StampCapture<'a> {
    stamps: StampSender<'a>,
    stats: &'a CaptureStats,
}

impl<'a> StampCapture<'a> {
    pub fn new(
        stamps: StampSender<'a>,
        stats: &'a CaptureStats,
    ) -> Self {
        Self { stamps, stats }
    }

    /// Queue one echo transition. Returns false if the stamp was dropped.
    pub fn on_edge(
        &mut self,
        edge: Edge,
        at: Timestamp,
    ) -> bool {
        if self.stamps.try_send(EdgeStamp { edge, at }).is_err() {
            self.stats.record_dropped();
            return false;
        }
        true
    }
}

// =============================================================================
// Echo Watch
// =============================================================================

/// Receiver of edges from [`capture_echo`].
pub trait EdgeSink {
    fn push_edge(
        &mut self,
        edge: Edge,
        at: Timestamp,
    );

    /// The fall did not arrive within the window after a rise.
    fn fall_missed(&mut self) {}
}

impl EdgeSink for EdgeCapture<'_> {
    fn push_edge(
        &mut self,
        edge: Edge,
        at: Timestamp,
    ) {
        self.on_edge(edge, at);
    }

    fn fall_missed(&mut self) { self.abandon(); }
}

// A missed fall needs nothing here: the assembler abandons the rise.
impl EdgeSink for StampCapture<'_> {
    fn push_edge(
        &mut self,
        edge: Edge,
        at: Timestamp,
    ) {
        self.on_edge(edge, at);
    }
}

/// Capture one echo pulse: a rise, then the fall within `fall_window`.
///
/// Each edge is stamped as soon as its wait completes.
pub async fn capture_echo<W, S>(
    echo: &mut W,
    sink: &mut S,
    fall_window: Duration,
) -> Result<(), W::Error>
where
    W: Wait,
    S: EdgeSink,
{
    echo.wait_for_rising_edge().await?;
    sink.push_edge(Edge::Rising, Timestamp::now());

    match with_timeout(fall_window, echo.wait_for_falling_edge()).await {
        Ok(fell) => {
            fell?;
            sink.push_edge(Edge::Falling, Timestamp::now());
        }
        Err(_) => sink.fall_missed(),
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
