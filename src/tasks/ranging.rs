//! Ranging task.
//!
//! Publishes one reading per trigger ping. The reading queue holds a single
//! entry, so this task stalls on `send` whenever presentation falls behind;
//! leftovers from the pings it missed are discarded on the next cycle.

use defmt::{debug, info, warn};
use sonar_ranging::config::ECHO_WINDOW;
use sonar_ranging::ranging::{Distance, Ranger};

#[embassy_executor::task]
pub async fn ranging_task(mut ranger: Ranger<'static>) {
    info!("Ranging task started (echo window {} ms)", ECHO_WINDOW.as_millis());

    loop {
        let cycle = ranger.cycle().await;
        if cycle.discarded > 0 {
            warn!("Discarded {} stale samples before ping", cycle.discarded);
        }
        match cycle.pulse {
            Some(pulse) => debug!(
                "pulse {} us, distance {} cm -> {}",
                pulse.as_micros(),
                Distance::from_pulse(pulse).cm(),
                cycle.reading
            ),
            None => debug!("no echo"),
        }
    }
}
