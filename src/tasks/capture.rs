//! Echo edge capture task.
//!
//! Spawned on the interrupt-priority executor, so each edge is handled ahead
//! of every thread-mode task. The task alternates between waiting for a rise
//! and waiting for the matching fall. Each edge is stamped as soon as its
//! wait completes. A fall that does not come within the echo window releases
//! the rise.
//!
//! Nothing here logs per edge. Drops and discards are counted in
//! [`sonar_ranging::capture::CaptureStats`] and reported by presentation.

use defmt::info;
use embassy_rp::gpio::Input;
use sonar_ranging::capture::capture_echo;
#[cfg(not(feature = "timestamp-queue"))]
use sonar_ranging::capture::EdgeCapture;
#[cfg(feature = "timestamp-queue")]
use sonar_ranging::capture::StampCapture;
use sonar_ranging::config::ECHO_WINDOW;

/// Pair edges in interrupt context and send finished pulse widths.
#[cfg(not(feature = "timestamp-queue"))]
#[embassy_executor::task]
pub async fn edge_capture_task(
    mut echo: Input<'static>,
    mut capture: EdgeCapture<'static>,
) {
    info!("Edge capture task started (stateful merge)");

    loop {
        // Input's wait error type is Infallible
        let _ = capture_echo(&mut echo, &mut capture, ECHO_WINDOW).await;
    }
}

/// Forward every edge timestamp to the ranging task.
#[cfg(feature = "timestamp-queue")]
#[embassy_executor::task]
pub async fn stamp_capture_task(
    mut echo: Input<'static>,
    mut capture: StampCapture<'static>,
) {
    info!("Edge capture task started (timestamp queue)");

    loop {
        let _ = capture_echo(&mut echo, &mut capture, ECHO_WINDOW).await;
    }
}
