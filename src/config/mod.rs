//! Application configuration.
//!
//! - `layout`: Display dimensions and readout geometry
//! - `ranging`: Sensor physics, classification limits, pipeline timing and queue depths

pub mod layout;
pub mod ranging;

// Re-export layout constants at config level for convenience
pub use layout::{
    BAR_HEIGHT,
    BAR_TOP,
    DISPLAY_HEIGHT_PX,
    DISPLAY_WIDTH_PX,
    FRAMEBUFFER_SIZE,
    TITLE_ROW,
    VALUE_ROW,
};
// Re-export ranging constants at config level for convenience
pub use ranging::{
    ECHO_WINDOW,
    MAX_VALID_CM,
    PRESENTATION_WAIT,
    PING_WAIT,
    PULSE_QUEUE_DEPTH,
    READING_QUEUE_DEPTH,
    SCALE_CM,
    SOUND_CM_NUMERATOR,
    SOUND_ROUND_TRIP_DENOMINATOR,
    STAMP_QUEUE_DEPTH,
    STATS_LOG_INTERVAL,
    TRIGGER_PERIOD,
    TRIGGER_PULSE_US,
};
