//! Ranging pipeline constants.
//!
//! # Distance conversion
//!
//! Sound travels 0.0343 cm/us and the echo pulse covers the round trip, so
//! `distance = pulse_us * 0.0343 / 2 = pulse_us * 343 / 20_000`. Keeping the
//! ratio as two integers makes the rounding exact with no float in the path.

use embassy_time::Duration;

// =============================================================================
// Sensor Physics
// =============================================================================

/// Speed of sound numerator (0.0343 cm/us = 343 / 10_000).
pub const SOUND_CM_NUMERATOR: u64 = 343;

/// Denominator including the round-trip halving (10_000 * 2).
pub const SOUND_ROUND_TRIP_DENOMINATOR: u64 = 20_000;

// =============================================================================
// Classification
// =============================================================================

/// Largest distance reported as a valid reading. Anything farther is out of range.
pub const MAX_VALID_CM: i32 = 300;

/// Distance that fills the whole bar width.
pub const SCALE_CM: i32 = 400;

// =============================================================================
// Timing
// =============================================================================

/// Trigger cadence. HC-SR04 needs at least 60 ms between pings.
pub const TRIGGER_PERIOD: Duration = Duration::from_millis(500);

/// Trigger pulse width in microseconds.
pub const TRIGGER_PULSE_US: u32 = 10;

/// How long ranging waits for a pulse after a ping before reporting no echo.
///
/// Measured from the ping, not from the previous reading. The sensor drops
/// its echo line after about 38 ms without a return, so nothing of a ping
/// is still in flight once the window closes, well before the next ping.
pub const ECHO_WINDOW: Duration = Duration::from_millis(100);

/// Longest wait for the trigger's ping before the cycle reports no echo.
pub const PING_WAIT: Duration = Duration::from_millis(2 * TRIGGER_PERIOD.as_millis());

/// How long presentation waits for a reading before showing the no-reading indicator.
pub const PRESENTATION_WAIT: Duration = Duration::from_secs(1);

/// Presentation logs the capture counters every this many readings.
pub const STATS_LOG_INTERVAL: u32 = 20;

// =============================================================================
// Queue Depths
// =============================================================================

/// Interrupt-to-ranging pulse queue (stateful-merge capture).
pub const PULSE_QUEUE_DEPTH: usize = 4;

/// Interrupt-to-ranging timestamp queue (timestamp-queue capture). Two entries per cycle.
pub const STAMP_QUEUE_DEPTH: usize = 10;

/// Ranging-to-presentation reading queue. Ranging blocks when it is full.
pub const READING_QUEUE_DEPTH: usize = 1;

// =============================================================================
// Unit Tests
// =============================================================================
