//! Presentation task: render each reading and flush it to the OLED.
//!
//! Display bus errors are logged and the frame is skipped; the next reading
//! gets a fresh attempt. Every [`STATS_LOG_INTERVAL`] readings the capture
//! counters are logged, with a warning when samples were lost since the last
//! report.

use defmt::{info, warn};
use embassy_rp::i2c::{Async, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Instant;
use sonar_ranging::capture::CaptureCounters;
use sonar_ranging::config::{PRESENTATION_WAIT, STATS_LOG_INTERVAL};
use sonar_ranging::framebuffer::MonoFramebuffer;
use sonar_ranging::pipeline::Pipeline;
use sonar_ranging::presentation::{next_reading, render_reading};
use sonar_ranging::ssd1306::Ssd1306;

/// SSD1306 on I2C0.
pub type Display = Ssd1306<I2c<'static, I2C0, Async>>;

#[embassy_executor::task]
pub async fn presentation_task(
    mut display: Display,
    pipeline: &'static Pipeline,
) {
    info!("Presentation task started");

    match display.init().await {
        Ok(()) => info!("Display initialized"),
        Err(e) => warn!("Display init failed: {}", e),
    }

    let gate = if cfg!(feature = "gated-presentation") {
        Some(&pipeline.cycle)
    } else {
        None
    };
    let readings = pipeline.readings.receiver();
    let mut frame = MonoFramebuffer::new();

    let mut shown: u32 = 0;
    let mut errors: u32 = 0;
    let mut last_stats = CaptureCounters::default();
    let mut last_stats_at = Instant::now();

    loop {
        let reading = next_reading(&readings, gate, PRESENTATION_WAIT).await;
        if reading.is_error() {
            errors = errors.wrapping_add(1);
        }

        render_reading(&mut frame, reading);
        if let Err(e) = display.flush(&frame).await {
            warn!("Display flush failed, frame skipped: {}", e);
        }

        shown = shown.wrapping_add(1);
        if shown.is_multiple_of(STATS_LOG_INTERVAL) {
            let stats = pipeline.stats.snapshot();
            info!(
                "STATS: readings={} errors={} pulses={} spurious={} abandoned={} anomalies={} dropped={} ({} ms)",
                shown,
                errors,
                stats.pulses,
                stats.spurious,
                stats.abandoned,
                stats.anomalies,
                stats.dropped,
                last_stats_at.elapsed().as_millis()
            );
            if stats.dropped != last_stats.dropped {
                warn!("Lost {} capture samples to a full queue", stats.dropped.wrapping_sub(last_stats.dropped));
            }
            last_stats = stats;
            last_stats_at = Instant::now();
        }
    }
}
