//! Pulse-to-distance conversion and reading classification.
//!
//! The ranging stage waits for at most one pulse per trigger cycle, converts
//! it to centimeters and publishes a [`Reading`]. Every cycle publishes
//! exactly one reading, including the cycles where no echo arrived.
//!
//! With a ping signal attached, a cycle starts from the trigger: anything
//! left over from earlier pings is discarded, then the ranger waits for the
//! next ping and gives its echo one window. A reading therefore always
//! belongs to the ping it follows, however late the ranger was.

use embassy_time::{Duration, Instant, with_deadline, with_timeout};

use crate::capture::CaptureStats;
use crate::config::{MAX_VALID_CM, SOUND_CM_NUMERATOR, SOUND_ROUND_TRIP_DENOMINATOR};
use crate::pipeline::{CycleSignal, PulseReceiver, ReadingSender, StampReceiver};
use crate::pulse::{EdgePairer, PairOutcome, PulseDuration};

// =============================================================================
// Distance
// =============================================================================

/// Signed distance in whole centimeters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Distance(i32);

impl Distance {
    #[inline]
    pub const fn from_cm(cm: i32) -> Self { Self(cm) }

    #[inline]
    pub const fn cm(self) -> i32 { self.0 }

    /// Convert an echo width to distance, rounding half up.
    ///
    /// `pulse_us * 0.0343 / 2` computed exactly as
    /// `(pulse_us * 343 + 10_000) / 20_000`.
    pub const fn from_pulse(pulse: PulseDuration) -> Self {
        let scaled = pulse.as_micros() as u64 * SOUND_CM_NUMERATOR + SOUND_ROUND_TRIP_DENOMINATOR / 2;
        // u32::MAX us is about 736k cm, well inside i32
        Self((scaled / SOUND_ROUND_TRIP_DENOMINATOR) as i32)
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Classified outcome of one ranging cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Reading {
    /// Distance within `0..=MAX_VALID_CM`.
    Valid(Distance),
    /// Echo measured but beyond the trusted range.
    OutOfRange,
    /// No usable echo this cycle.
    NoEcho,
}

impl Reading {
    /// Classify a computed distance. Total over all `i32` values.
    pub const fn classify(distance: Distance) -> Self {
        match distance.cm() {
            cm if cm < 0 => Self::NoEcho,
            cm if cm > MAX_VALID_CM => Self::OutOfRange,
            _ => Self::Valid(distance),
        }
    }

    /// Reading for a cycle that did or did not produce a pulse.
    pub const fn from_pulse(pulse: Option<PulseDuration>) -> Self {
        match pulse {
            Some(pulse) => Self::classify(Distance::from_pulse(pulse)),
            None => Self::NoEcho,
        }
    }

    #[inline]
    pub const fn is_error(self) -> bool { !matches!(self, Self::Valid(_)) }

    /// Distance of a valid reading.
    #[inline]
    pub const fn distance(self) -> Option<Distance> {
        match self {
            Self::Valid(distance) => Some(distance),
            _ => None,
        }
    }
}

// =============================================================================
// Pulse Sources
// =============================================================================

/// Pairs raw edge stamps on the thread side.
///
/// Tolerates odd or missing stamps: a stray fall is dropped, a second rise
/// restarts the pair, and a rise still pending when the window closes is
/// abandoned so it can never pair with a later cycle's fall.
pub struct PulseAssembler<'a> {
    stamps: StampReceiver<'a>,
    pairer: EdgePairer,
    stats: &'a CaptureStats,
}

impl<'a> PulseAssembler<'a> {
    pub fn new(
        stamps: StampReceiver<'a>,
        stats: &'a CaptureStats,
    ) -> Self {
        Self {
            stamps,
            pairer: EdgePairer::new(),
            stats,
        }
    }

    /// Pull stamps until a pulse is assembled or `window` elapses.
    pub async fn next_pulse(
        &mut self,
        window: Duration,
    ) -> Option<PulseDuration> {
        let deadline = Instant::now() + window;
        loop {
            let Ok(stamp) = with_deadline(deadline, self.stamps.receive()).await else {
                if self.pairer.abandon() {
                    self.stats.record(PairOutcome::Abandoned);
                }
                return None;
            };

            let outcome = self.pairer.on_edge(stamp);
            self.stats.record(outcome);
            match outcome {
                PairOutcome::Paired(pulse) => return Some(pulse),
                PairOutcome::ClockAnomaly => return None,
                PairOutcome::Armed | PairOutcome::Abandoned | PairOutcome::Spurious => {}
            }
        }
    }

    /// Drop queued stamps and any pending rise. Returns the stamps dropped.
    pub fn discard_stale(&mut self) -> u32 {
        let mut dropped = 0;
        while self.stamps.try_receive().is_ok() {
            dropped += 1;
        }
        if self.pairer.abandon() {
            self.stats.record(PairOutcome::Abandoned);
        }
        dropped
    }

    /// Whether a rise is waiting for its fall.
    #[inline]
    pub const fn is_armed(&self) -> bool { self.pairer.is_armed() }
}

/// Where the ranging stage gets its pulses from.
pub enum PulseSource<'a> {
    /// Finished widths from [`crate::capture::EdgeCapture`].
    Merged(PulseReceiver<'a>),
    /// Raw stamps from [`crate::capture::StampCapture`].
    Stamps(PulseAssembler<'a>),
}

impl PulseSource<'_> {
    /// Next pulse within `window`, or `None` when the window expires.
    pub async fn next_pulse(
        &mut self,
        window: Duration,
    ) -> Option<PulseDuration> {
        match self {
            Self::Merged(pulses) => with_timeout(window, pulses.receive()).await.ok(),
            Self::Stamps(assembler) => assembler.next_pulse(window).await,
        }
    }

    /// Drop everything queued so far. Returns the number of items dropped.
    pub fn discard_stale(&mut self) -> u32 {
        match self {
            Self::Merged(pulses) => {
                let mut dropped = 0;
                while pulses.try_receive().is_ok() {
                    dropped += 1;
                }
                dropped
            }
            Self::Stamps(assembler) => assembler.discard_stale(),
        }
    }
}

// =============================================================================
// Ranger
// =============================================================================

/// Result of one ranging cycle, returned for logging.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct RangingCycle {
    pub pulse: Option<PulseDuration>,
    pub reading: Reading,
    /// Pulses or stamps left over from earlier pings and thrown away.
    pub discarded: u32,
}

/// Ranging stage: one pulse in, one reading out, per cycle.
pub struct Ranger<'a> {
    source: PulseSource<'a>,
    readings: ReadingSender<'a>,
    window: Duration,
    ping: Option<(&'a CycleSignal, Duration)>,
}

impl<'a> Ranger<'a> {
    pub fn new(
        source: PulseSource<'a>,
        readings: ReadingSender<'a>,
        window: Duration,
    ) -> Self {
        Self {
            source,
            readings,
            window,
            ping: None,
        }
    }

    /// Start every cycle from `ping`, waiting at most `wait` for it.
    ///
    /// The echo window is then measured from the ping.
    pub fn with_ping(
        mut self,
        ping: &'a CycleSignal,
        wait: Duration,
    ) -> Self {
        self.ping = Some((ping, wait));
        self
    }

    /// Run one cycle. Waits on the reading queue if presentation is behind.
    ///
    /// With a ping attached, a ping raised before the cycle began is treated
    /// as stale along with its echo, and the cycle waits for a fresh one. A
    /// ping that does not come within its wait yields [`Reading::NoEcho`].
    pub async fn cycle(&mut self) -> RangingCycle {
        let mut discarded = 0;
        let pulse = match self.ping {
            Some((ping, wait)) => {
                discarded = self.source.discard_stale();
                ping.reset();
                match with_timeout(wait, ping.wait()).await {
                    Ok(()) => self.source.next_pulse(self.window).await,
                    Err(_) => None,
                }
            }
            None => self.source.next_pulse(self.window).await,
        };
        let reading = Reading::from_pulse(pulse);
        self.readings.send(reading).await;
        RangingCycle {
            pulse,
            reading,
            discarded,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
