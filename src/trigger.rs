//! Sensor trigger driver.
//!
//! Emits the activation pulse on a fixed cadence: pin high, hold
//! [`TRIGGER_PULSE_US`](crate::config::TRIGGER_PULSE_US), pin low, then wait
//! out the rest of the period. The pin is always low again before the period
//! wait begins.
//!
//! How the pin is held high is a [`PulseHold`]. [`TimerHold`] waits on an
//! [`embassy_time::Timer`], so the executor is free during the hold.
//! [`BusyHold`] spins through [`DelayNs`] for a tighter pulse width.

use core::future::{Future, ready};

use embassy_time::{Duration, Timer};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::TRIGGER_PULSE_US;
use crate::pipeline::CycleSignal;

// =============================================================================
// Pulse Hold
// =============================================================================

/// Keeps the trigger pin high for the pulse width.
pub trait PulseHold {
    fn hold(
        &mut self,
        micros: u32,
    ) -> impl Future<Output = ()>;
}

/// Async hold on the embassy timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerHold;

impl PulseHold for TimerHold {
    fn hold(
        &mut self,
        micros: u32,
    ) -> impl Future<Output = ()> {
        Timer::after_micros(u64::from(micros))
    }
}

/// Busy-wait hold. Blocks the executor for the pulse width.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyHold<D>(pub D);

impl<D: DelayNs> PulseHold for BusyHold<D> {
    fn hold(
        &mut self,
        micros: u32,
    ) -> impl Future<Output = ()> {
        self.0.delay_us(micros);
        ready(())
    }
}

// =============================================================================
// Trigger Driver
// =============================================================================

/// Periodic trigger for the ultrasonic sensor.
pub struct TriggerDriver<'a, P, H> {
    pin: P,
    hold: H,
    period: Duration,
    ping: Option<&'a CycleSignal>,
    cycle_done: Option<&'a CycleSignal>,
    fired: u32,
}

impl<'a, P, H> TriggerDriver<'a, P, H>
where
    P: OutputPin,
    H: PulseHold,
{
    pub fn new(
        pin: P,
        hold: H,
        period: Duration,
    ) -> Self {
        Self {
            pin,
            hold,
            period,
            ping: None,
            cycle_done: None,
            fired: 0,
        }
    }

    /// Raise `signal` the moment each pulse ends, for the ranging side.
    pub fn with_ping_signal(
        mut self,
        signal: &'a CycleSignal,
    ) -> Self {
        self.ping = Some(signal);
        self
    }

    /// Raise `signal` after every emitted pulse, for the presentation gate.
    pub fn with_cycle_signal(
        mut self,
        signal: &'a CycleSignal,
    ) -> Self {
        self.cycle_done = Some(signal);
        self
    }

    /// Emit one activation pulse.
    pub async fn pulse(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()?;
        self.hold.hold(TRIGGER_PULSE_US).await;
        self.pin.set_low()
    }

    /// One full cycle: pulse, signal completion, wait out the period.
    ///
    /// The period wait runs even if the pin reported an error.
    pub async fn cycle(&mut self) -> Result<(), P::Error> {
        let result = self.pulse().await;
        if result.is_ok() {
            self.fired = self.fired.wrapping_add(1);
            for signal in [self.ping, self.cycle_done].into_iter().flatten() {
                signal.signal(());
            }
        }
        Timer::after(self.period).await;
        result
    }

    /// Pulses emitted so far.
    #[inline]
    pub const fn fired(&self) -> u32 { self.fired }
}

// =============================================================================
// Unit Tests
// =============================================================================
