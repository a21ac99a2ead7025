//! End-to-end tests for the ranging pipeline on the host.
//!
//! Each test wires a fresh [`Pipeline`] the way the firmware does. Each
//! ranging cycle runs alongside a trigger ping and the synthetic echo edges
//! that follow it. The result is read back through the presentation contract
//! onto a [`MonoFramebuffer`].
//!
//! Async stages are driven with `embassy_futures::block_on` on the
//! `embassy-time` std driver. Timeouts are shortened so the no-echo paths
//! finish quickly.

use core::convert::Infallible;

use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_futures::select::select;
use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, OutputPin};
use sonar_ranging::capture::EdgeCapture;
use sonar_ranging::framebuffer::MonoFramebuffer;
use sonar_ranging::pipeline::{Pipeline, ReadingReceiver};
use sonar_ranging::presentation::{next_reading, render_reading};
use sonar_ranging::pulse::{Edge, Timestamp};
use sonar_ranging::ranging::{Distance, Ranger, RangingCycle, Reading};
use sonar_ranging::trigger::{TimerHold, TriggerDriver};

const WINDOW: Duration = Duration::from_millis(30);

fn at(us: u64) -> Timestamp { Timestamp::from_micros(us) }

/// Run one ranging cycle while the trigger pings and `echo` delivers edges.
fn ping_and_range(
    pipeline: &Pipeline,
    ranger: &mut Ranger<'_>,
    echo: impl FnOnce(),
) -> RangingCycle {
    let (cycle, ()) = block_on(join(ranger.cycle(), async move {
        pipeline.ping.signal(());
        echo();
    }));
    cycle
}

fn present(readings: &ReadingReceiver<'_>) -> (Reading, MonoFramebuffer) {
    let reading = block_on(next_reading(readings, None, WINDOW));
    let mut frame = MonoFramebuffer::new();
    render_reading(&mut frame, reading);
    (reading, frame)
}

fn bar_lit(frame: &MonoFramebuffer) -> bool { (0..128).any(|x| frame.pixel(x, 25)) }

// =============================================================================
// Stateful Merge
// =============================================================================

#[test]
fn test_one_centimeter_reading() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(1000));
        capture.on_edge(Edge::Falling, at(1058));
    });
    assert_eq!(cycle.pulse.map(|p| p.as_micros()), Some(58));

    let (reading, frame) = present(&readings);
    assert_eq!(reading, Reading::Valid(Distance::from_cm(1)));
    // 1 cm is below one bar pixel
    assert!(!bar_lit(&frame));
    assert!(frame.lit_count() > 0);
}

#[test]
fn test_out_of_range_reading() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    // 17_784 us -> 305 cm
    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(10_000));
        capture.on_edge(Edge::Falling, at(27_784));
    });
    assert_eq!(cycle.reading, Reading::OutOfRange);
    let (reading, frame) = present(&readings);
    assert_eq!(reading, Reading::OutOfRange);
    assert!(!bar_lit(&frame));
}

#[test]
fn test_missing_echo_then_recovery() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    // Ping with no edges at all
    assert_eq!(ping_and_range(&pipeline, &mut ranger, || {}).reading, Reading::NoEcho);
    let (reading, frame) = present(&readings);
    assert_eq!(reading, Reading::NoEcho);
    assert!(frame.lit_count() > 0);
    assert!(!bar_lit(&frame));

    // Next ping is unaffected: 5831 us -> 100 cm
    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(500_000));
        capture.on_edge(Edge::Falling, at(505_831));
    });
    assert_eq!(cycle.reading, Reading::Valid(Distance::from_cm(100)));
    let (_, frame) = present(&readings);
    assert!(frame.pixel(31, 25));
    assert!(!frame.pixel(32, 25));
}

#[test]
fn test_spurious_fall_does_not_produce_reading() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Falling, at(42));
    });
    assert_eq!(cycle.reading, Reading::NoEcho);
    assert_eq!(pipeline.stats.snapshot().spurious, 1);
}

#[test]
fn test_identical_cycles_identical_readings() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    let mut seen = Vec::new();
    for cycle in 0..3u64 {
        let start = cycle * 500_000;
        ping_and_range(&pipeline, &mut ranger, || {
            capture.on_edge(Edge::Rising, at(start));
            capture.on_edge(Edge::Falling, at(start + 2915));
        });
        seen.push(present(&readings).0);
    }
    assert!(seen.iter().all(|r| *r == Reading::Valid(Distance::from_cm(50))));
}

#[test]
fn test_echo_from_earlier_ping_is_discarded() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    // Left over while the ranger was busy elsewhere
    capture.on_edge(Edge::Rising, at(10_000));
    capture.on_edge(Edge::Falling, at(27_784));

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(500_000));
        capture.on_edge(Edge::Falling, at(505_831));
    });
    assert_eq!(cycle.discarded, 1);
    assert_eq!(cycle.reading, Reading::Valid(Distance::from_cm(100)));
    assert_eq!(present(&readings).0, Reading::Valid(Distance::from_cm(100)));
    assert!(pipeline.pulses.is_empty());
}

#[test]
fn test_presentation_times_out_without_ranging() {
    let pipeline = Pipeline::new();
    let readings = pipeline.readings.receiver();
    let (reading, _) = present(&readings);
    assert_eq!(reading, Reading::NoEcho);
}

// =============================================================================
// Timestamp Queue
// =============================================================================

#[test]
fn test_timestamp_queue_one_centimeter() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.stamp_capture();
    let mut ranger = pipeline.stamp_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(1000));
        capture.on_edge(Edge::Falling, at(1058));
    });
    assert_eq!(cycle.reading, Reading::Valid(Distance::from_cm(1)));
    assert_eq!(present(&readings).0, Reading::Valid(Distance::from_cm(1)));
}

#[test]
fn test_timestamp_queue_tolerates_odd_stamps() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.stamp_capture();
    let mut ranger = pipeline.stamp_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    // Stray fall, then a rise that is superseded, then a clean pair
    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Falling, at(10));
        capture.on_edge(Edge::Rising, at(100));
        capture.on_edge(Edge::Rising, at(1000));
        capture.on_edge(Edge::Falling, at(1058));
    });
    assert_eq!(cycle.reading, Reading::Valid(Distance::from_cm(1)));
    present(&readings);

    let stats = pipeline.stats.snapshot();
    assert_eq!(stats.spurious, 1);
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.pulses, 1);
}

#[test]
fn test_timestamp_queue_lone_rise_times_out() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.stamp_capture();
    let mut ranger = pipeline.stamp_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(1000));
    });
    assert_eq!(cycle.reading, Reading::NoEcho);
    present(&readings);

    // The lone rise must not pair with the next ping's fall
    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Falling, at(500_058));
    });
    assert_eq!(cycle.reading, Reading::NoEcho);
    assert_eq!(pipeline.stats.snapshot().abandoned, 1);
}

#[test]
fn test_timestamp_queue_discards_stamps_from_earlier_ping() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.stamp_capture();
    let mut ranger = pipeline.stamp_ranger(WINDOW);

    capture.on_edge(Edge::Rising, at(10_000));
    capture.on_edge(Edge::Falling, at(27_784));

    let cycle = ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(500_000));
        capture.on_edge(Edge::Falling, at(505_831));
    });
    assert_eq!(cycle.discarded, 2);
    assert_eq!(cycle.reading, Reading::Valid(Distance::from_cm(100)));
}

// =============================================================================
// Gated Presentation
// =============================================================================

#[test]
fn test_gated_presentation_waits_for_cycle_signal() {
    let pipeline = Pipeline::new();
    let mut capture = pipeline.edge_capture();
    let mut ranger = pipeline.merged_ranger(WINDOW);
    let readings = pipeline.readings.receiver();

    ping_and_range(&pipeline, &mut ranger, || {
        capture.on_edge(Edge::Rising, at(1000));
        capture.on_edge(Edge::Falling, at(1058));
    });

    // No trigger completion yet: presentation reports no reading
    let gated = block_on(next_reading(&readings, Some(&pipeline.cycle), WINDOW));
    assert_eq!(gated, Reading::NoEcho);

    pipeline.cycle.signal(());
    let gated = block_on(next_reading(&readings, Some(&pipeline.cycle), WINDOW));
    assert_eq!(gated, Reading::Valid(Distance::from_cm(1)));
}

// =============================================================================
// Trigger and Ranging Together
// =============================================================================

/// Trigger pin wired straight to a sensor model.
///
/// As each pulse ends, pings picked by `echoes` send a 5831 us (100 cm)
/// echo into the capture front end. The others get no echo.
struct EchoingPin<'a> {
    capture: EdgeCapture<'a>,
    echoes: fn(u32) -> bool,
    pings: u32,
}

impl ErrorType for EchoingPin<'_> {
    type Error = Infallible;
}

impl OutputPin for EchoingPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if (self.echoes)(self.pings) {
            let rise = Timestamp::now().as_micros();
            self.capture.on_edge(Edge::Rising, at(rise));
            self.capture.on_edge(Edge::Falling, at(rise + 5831));
        }
        self.pings += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
}

const HUNDRED_CM: Reading = Reading::Valid(Distance::from_cm(100));

/// Run the real trigger against a ping-synced ranger for `pings` pings.
///
/// Returns the readings in order and the number of stale samples discarded.
fn run_trigger_and_ranger(
    pings: usize,
    echoes: fn(u32) -> bool,
) -> (Vec<Reading>, u32) {
    const PERIOD: Duration = Duration::from_millis(50);
    const ECHO_WINDOW: Duration = Duration::from_millis(20);

    let pipeline = Pipeline::new();
    let pin = EchoingPin {
        capture: pipeline.edge_capture(),
        echoes,
        pings: 0,
    };
    let mut trigger = TriggerDriver::new(pin, TimerHold, PERIOD)
        .with_ping_signal(&pipeline.ping)
        .with_cycle_signal(&pipeline.cycle);
    let mut ranger = pipeline.merged_ranger(ECHO_WINDOW);
    let readings = pipeline.readings.receiver();

    let mut seen = Vec::new();
    let mut discarded = 0;
    block_on(select(
        join(
            async {
                for _ in 0..pings {
                    trigger.cycle().await.unwrap();
                }
            },
            async {
                while seen.len() < pings {
                    seen.push(readings.receive().await);
                }
            },
        ),
        async {
            loop {
                discarded += ranger.cycle().await.discarded;
            }
        },
    ));

    assert_eq!(trigger.fired() as usize, pings);
    assert_eq!(pipeline.stats.snapshot().dropped, 0);
    (seen, discarded)
}

#[test]
fn test_trigger_and_ranger_one_reading_per_ping() {
    let (seen, discarded) = run_trigger_and_ranger(16, |_| true);
    assert_eq!(seen, vec![HUNDRED_CM; 16]);
    assert_eq!(discarded, 0);
}

#[test]
fn test_trigger_and_ranger_stay_in_step_across_missed_echoes() {
    let (seen, discarded) = run_trigger_and_ranger(12, |ping| ping % 2 == 0);
    let expected: Vec<Reading> = (0..12)
        .map(|ping| if ping % 2 == 0 { HUNDRED_CM } else { Reading::NoEcho })
        .collect();
    assert_eq!(seen, expected);
    assert_eq!(discarded, 0);
}
