//! Monochrome framebuffer in SSD1306 page layout.
//!
//! The panel memory is split into pages of 8 pixel rows. Each byte holds one
//! column of a page with the top row in bit 0, so pixel `(x, y)` lives at
//! byte `x + (y / 8) * WIDTH`, bit `y % 8`. Keeping the buffer in this layout
//! lets [`crate::ssd1306::Ssd1306::flush`] send it unchanged.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, FRAMEBUFFER_SIZE};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// 128x32 one-bit framebuffer.
pub struct MonoFramebuffer {
    buffer: [u8; FRAMEBUFFER_SIZE],
}

impl MonoFramebuffer {
    /// Create a blank (all off) framebuffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAMEBUFFER_SIZE],
        }
    }

    /// Raw page-layout bytes, ready for the panel.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8] { &self.buffer }

    /// Whether the pixel at `(x, y)` is on. Out of bounds reads as off.
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> bool {
        match Self::locate(x, y) {
            Some((idx, mask)) => self.buffer[idx] & mask != 0,
            None => false,
        }
    }

    /// Turn every pixel off.
    pub fn clear_buffer(&mut self) { self.buffer.fill(0); }

    /// Number of pixels turned on.
    pub fn lit_count(&self) -> u32 { self.buffer.iter().map(|b| b.count_ones()).sum() }

    #[inline]
    fn locate(
        x: i32,
        y: i32,
    ) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some((x + (y / 8) * WIDTH, 1 << (y % 8)))
    }

    #[inline]
    fn set_pixel(
        &mut self,
        x: i32,
        y: i32,
        color: BinaryColor,
    ) {
        if let Some((idx, mask)) = Self::locate(x, y) {
            match color {
                BinaryColor::On => self.buffer[idx] |= mask,
                BinaryColor::Off => self.buffer[idx] &= !mask,
            }
        }
    }
}

impl Default for MonoFramebuffer {
    fn default() -> Self { Self::new() }
}

impl OriginDimensions for MonoFramebuffer {
    fn size(&self) -> Size { Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX) }
}

impl DrawTarget for MonoFramebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.size == Size::zero() {
            return Ok(());
        }

        for y in drawable_area.rows() {
            for x in drawable_area.columns() {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let fill = match color {
            BinaryColor::On => 0xFF,
            BinaryColor::Off => 0x00,
        };
        self.buffer.fill(fill);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_blank() {
        let fb = MonoFramebuffer::new();
        assert_eq!(fb.as_bytes().len(), FRAMEBUFFER_SIZE);
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_page_layout() {
        let mut fb = MonoFramebuffer::new();
        fb.set_pixel(0, 0, BinaryColor::On);
        fb.set_pixel(5, 9, BinaryColor::On);
        fb.set_pixel(127, 31, BinaryColor::On);

        let bytes = fb.as_bytes();
        assert_eq!(bytes[0], 0b0000_0001);
        // Page 1, column 5, bit 1
        assert_eq!(bytes[128 + 5], 0b0000_0010);
        // Last page, last column, bit 7
        assert_eq!(bytes[3 * 128 + 127], 0b1000_0000);
        assert_eq!(fb.lit_count(), 3);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut fb = MonoFramebuffer::new();
        fb.set_pixel(-1, 0, BinaryColor::On);
        fb.set_pixel(128, 0, BinaryColor::On);
        fb.set_pixel(0, 32, BinaryColor::On);
        assert_eq!(fb.lit_count(), 0);
        assert!(!fb.pixel(200, 200));
    }

    #[test]
    fn test_pixel_off_clears_bit() {
        let mut fb = MonoFramebuffer::new();
        fb.set_pixel(3, 3, BinaryColor::On);
        assert!(fb.pixel(3, 3));
        fb.set_pixel(3, 3, BinaryColor::Off);
        assert!(!fb.pixel(3, 3));
    }

    #[test]
    fn test_fill_solid_clipped() {
        let mut fb = MonoFramebuffer::new();
        fb.fill_solid(&Rectangle::new(Point::new(120, 30), Size::new(20, 10)), BinaryColor::On)
            .ok();
        // Only 8 columns by 2 rows fit on the panel
        assert_eq!(fb.lit_count(), 16);
        assert!(fb.pixel(127, 31));
    }

    #[test]
    fn test_clear() {
        let mut fb = MonoFramebuffer::new();
        fb.clear(BinaryColor::On).ok();
        assert_eq!(fb.lit_count(), DISPLAY_WIDTH_PX * DISPLAY_HEIGHT_PX);
        fb.clear_buffer();
        assert_eq!(fb.lit_count(), 0);
    }
}
