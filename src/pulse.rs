//! Edge timestamps and pulse assembly.
//!
//! An echo pulse is bounded by a rising and a falling edge on the echo pin.
//! [`EdgePairer`] holds the single pending rise and turns the matching fall
//! into a [`PulseDuration`]. Whichever context owns the pairer owns the
//! pending slot; nothing else ever reads it.
//!
//! # Pairing Rules
//!
//! | Pending | Edge | Result |
//! |---------|------|--------|
//! | none | rising | armed |
//! | rise | rising | stale rise abandoned, new rise armed |
//! | rise | falling | pulse `fall - rise` (or clock anomaly if `fall <= rise`) |
//! | none | falling | spurious, discarded |

/// Monotonic microseconds since boot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from a raw microsecond count.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self { Self(micros) }

    /// Raw microsecond count.
    #[inline]
    pub const fn as_micros(self) -> u64 { self.0 }

    /// Current time from the embassy time driver.
    #[inline]
    pub fn now() -> Self { Self(embassy_time::Instant::now().as_micros()) }
}

/// Echo pulse width in microseconds. Always the difference of a paired rise and fall.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct PulseDuration(u32);

impl PulseDuration {
    /// Create a duration from a raw microsecond count.
    #[inline]
    pub const fn from_micros(micros: u32) -> Self { Self(micros) }

    /// Width between a rise and the following fall.
    ///
    /// Returns `None` unless `fall > rise`. Widths beyond `u32::MAX` saturate,
    /// which classifies as out of range downstream.
    pub fn between(
        rise: Timestamp,
        fall: Timestamp,
    ) -> Option<Self> {
        if fall <= rise {
            return None;
        }
        let width = fall.as_micros() - rise.as_micros();
        Some(Self(u32::try_from(width).unwrap_or(u32::MAX)))
    }

    /// Width in microseconds.
    #[inline]
    pub const fn as_micros(self) -> u32 { self.0 }
}

/// Logic-level transition on the echo input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Edge {
    /// Echo line went high: the sensor started its pulse.
    Rising,
    /// Echo line went low: the pulse ended.
    Falling,
}

/// One captured edge with the time it was observed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct EdgeStamp {
    pub edge: Edge,
    pub at: Timestamp,
}

impl EdgeStamp {
    pub const fn rising(at_us: u64) -> Self {
        Self {
            edge: Edge::Rising,
            at: Timestamp::from_micros(at_us),
        }
    }

    pub const fn falling(at_us: u64) -> Self {
        Self {
            edge: Edge::Falling,
            at: Timestamp::from_micros(at_us),
        }
    }
}

/// What a single edge did to the pairing state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum PairOutcome {
    /// A rise was recorded with nothing pending.
    Armed,
    /// A rise replaced a rise that never saw its fall.
    Abandoned,
    /// A fall completed the pending rise.
    Paired(PulseDuration),
    /// A fall arrived with no pending rise.
    Spurious,
    /// A fall was not later than its rise.
    ClockAnomaly,
}

/// Single-slot rise/fall pairing state.
#[derive(Debug, Default)]
pub struct EdgePairer {
    pending_rise: Option<Timestamp>,
}

impl EdgePairer {
    /// Create a pairer with nothing pending.
    pub const fn new() -> Self { Self { pending_rise: None } }

    /// Feed one edge. The pending slot is empty after every fall.
    pub fn on_edge(
        &mut self,
        stamp: EdgeStamp,
    ) -> PairOutcome {
        match stamp.edge {
            Edge::Rising => match self.pending_rise.replace(stamp.at) {
                Some(_) => PairOutcome::Abandoned,
                None => PairOutcome::Armed,
            },
            Edge::Falling => match self.pending_rise.take() {
                None => PairOutcome::Spurious,
                Some(rise) => match PulseDuration::between(rise, stamp.at) {
                    Some(pulse) => PairOutcome::Paired(pulse),
                    None => PairOutcome::ClockAnomaly,
                },
            },
        }
    }

    /// Drop a pending rise. Returns true if one was pending.
    pub fn abandon(&mut self) -> bool { self.pending_rise.take().is_some() }

    /// Whether a rise is waiting for its fall.
    #[inline]
    pub const fn is_armed(&self) -> bool { self.pending_rise.is_some() }
}

// =============================================================================
// Unit Tests
// =============================================================================
