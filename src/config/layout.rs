//! Display and readout layout constants.
//!
//! The panel is a 128x32 SSD1306 OLED. The readout uses three bands:
//! a title row, a value row and a 10 pixel tall proportional bar.

// =============================================================================
// Display Configuration
// =============================================================================

/// Display width in pixels.
pub const DISPLAY_WIDTH_PX: u32 = 128;

/// Display height in pixels.
pub const DISPLAY_HEIGHT_PX: u32 = 32;

/// Framebuffer size in bytes (one bit per pixel, 8 vertical pixels per byte).
pub const FRAMEBUFFER_SIZE: usize = (DISPLAY_WIDTH_PX * DISPLAY_HEIGHT_PX / 8) as usize;

// =============================================================================
// Readout Geometry
// =============================================================================

/// Top of the title / error text.
pub const TITLE_ROW: i32 = 0;

/// Top of the distance value text.
pub const VALUE_ROW: i32 = 10;

/// First pixel row of the distance bar.
pub const BAR_TOP: i32 = 20;

/// Bar height in pixels (rows 20..30).
pub const BAR_HEIGHT: u32 = 10;
