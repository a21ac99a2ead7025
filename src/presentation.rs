//! Readout rendering and the presentation side of the reading queue.
//!
//! Presentation owns no ranging logic. It waits for the next [`Reading`]
//! (showing the no-reading indicator if none arrives in time) and draws it:
//!
//! ```text
//!  row 0   Distance:
//!  row 10  123 cm
//!  row 20  ██████████████████████████████          (rows 20..30)
//! ```
//!
//! Error readings replace all three bands with a single indicator line.

use core::fmt::Write;

use embassy_time::{Duration, with_timeout};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;
use profont::PROFONT_7_POINT;

use crate::config::{BAR_HEIGHT, BAR_TOP, DISPLAY_WIDTH_PX, SCALE_CM, TITLE_ROW, VALUE_ROW};
use crate::pipeline::{CycleSignal, ReadingReceiver};
use crate::ranging::{Distance, Reading};

pub const TITLE_TEXT: &str = "Distance:";
pub const OUT_OF_RANGE_TEXT: &str = "Sensor error";
pub const NO_READING_TEXT: &str = "No reading";

/// Fits "-2147483648 cm".
const VALUE_TEXT_LEN: usize = 16;

const TEXT_STYLE: MonoTextStyle<'static, BinaryColor> = MonoTextStyle::new(&PROFONT_7_POINT, BinaryColor::On);
const BAR_STYLE: PrimitiveStyle<BinaryColor> = PrimitiveStyle::with_fill(BinaryColor::On);

// =============================================================================
// Reading Queue
// =============================================================================

/// Wait for the next reading, or [`Reading::NoEcho`] if none arrives.
///
/// With a `gate`, first waits for the trigger's cycle signal under the same
/// bound.
pub async fn next_reading(
    readings: &ReadingReceiver<'_>,
    gate: Option<&CycleSignal>,
    wait: Duration,
) -> Reading {
    if let Some(signal) = gate
        && with_timeout(wait, signal.wait()).await.is_err()
    {
        return Reading::NoEcho;
    }
    with_timeout(wait, readings.receive())
        .await
        .unwrap_or(Reading::NoEcho)
}

// =============================================================================
// Rendering
// =============================================================================

/// Bar width in pixels for a distance, clamped to the panel width.
pub fn bar_width_px(distance: Distance) -> u32 {
    let width = i64::from(distance.cm()) * i64::from(DISPLAY_WIDTH_PX) / i64::from(SCALE_CM);
    width.clamp(0, i64::from(DISPLAY_WIDTH_PX)) as u32
}

/// Value line, e.g. `"123 cm"`.
pub fn value_text(distance: Distance) -> String<VALUE_TEXT_LEN> {
    let mut text = String::new();
    let _ = write!(text, "{} cm", distance.cm());
    text
}

/// Error indicator line for a non-valid reading.
pub const fn error_text(reading: Reading) -> Option<&'static str> {
    match reading {
        Reading::Valid(_) => None,
        Reading::OutOfRange => Some(OUT_OF_RANGE_TEXT),
        Reading::NoEcho => Some(NO_READING_TEXT),
    }
}

/// Clear `display` and draw `reading`.
pub fn render_reading<D>(
    display: &mut D,
    reading: Reading,
) where
    D: DrawTarget<Color = BinaryColor>,
{
    display.clear(BinaryColor::Off).ok();

    let distance = match reading {
        Reading::Valid(distance) => distance,
        Reading::OutOfRange | Reading::NoEcho => {
            if let Some(text) = error_text(reading) {
                draw_line(display, text, TITLE_ROW);
            }
            return;
        }
    };

    draw_line(display, TITLE_TEXT, TITLE_ROW);
    draw_line(display, &value_text(distance), VALUE_ROW);

    let width = bar_width_px(distance);
    if width > 0 {
        Rectangle::new(Point::new(0, BAR_TOP), Size::new(width, BAR_HEIGHT))
            .into_styled(BAR_STYLE)
            .draw(display)
            .ok();
    }
}

fn draw_line<D>(
    display: &mut D,
    text: &str,
    row: i32,
) where
    D: DrawTarget<Color = BinaryColor>,
{
    Text::with_baseline(text, Point::new(0, row), TEXT_STYLE, Baseline::Top)
        .draw(display)
        .ok();
}

// =============================================================================
// Unit Tests
// =============================================================================
