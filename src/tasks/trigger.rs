//! Sensor trigger task.

use defmt::{info, warn};
use embassy_rp::gpio::Output;
#[cfg(feature = "blocking-trigger")]
use embassy_time::Delay;
use sonar_ranging::config::{TRIGGER_PERIOD, TRIGGER_PULSE_US};
#[cfg(feature = "blocking-trigger")]
use sonar_ranging::trigger::BusyHold;
#[cfg(not(feature = "blocking-trigger"))]
use sonar_ranging::trigger::TimerHold;
use sonar_ranging::trigger::TriggerDriver;

/// Pulse hold for the trigger pin.
#[cfg(not(feature = "blocking-trigger"))]
pub type SensorHold = TimerHold;
#[cfg(feature = "blocking-trigger")]
pub type SensorHold = BusyHold<Delay>;

/// Trigger driver on the RP2350 GPIO.
pub type SensorTrigger = TriggerDriver<'static, Output<'static>, SensorHold>;

/// Build the hold selected by the `blocking-trigger` feature.
pub fn sensor_hold() -> SensorHold {
    #[cfg(not(feature = "blocking-trigger"))]
    let hold = TimerHold;
    #[cfg(feature = "blocking-trigger")]
    let hold = BusyHold(Delay);
    hold
}

/// Fire the sensor every trigger period, forever.
#[embassy_executor::task]
pub async fn trigger_task(mut trigger: SensorTrigger) {
    info!(
        "Trigger task started ({} us pulse every {} ms)",
        TRIGGER_PULSE_US,
        TRIGGER_PERIOD.as_millis()
    );

    loop {
        if trigger.cycle().await.is_err() {
            warn!("Trigger pin write failed (fired={})", trigger.fired());
        }
    }
}
