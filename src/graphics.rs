//! Graphics Support for the 2.7" panel
//!
//! A fixed-size frame buffer that can be drawn on with [`embedded-graphics`]
//! and handed to
//! [`update_frame`](crate::traits::PervasiveDisplay::update_frame) as-is.
//!
//! [`embedded-graphics`]: https://docs.rs/embedded-graphics

use bit_field::BitField;
use embedded_graphics_core::prelude::*;

use crate::color::Color;
use crate::epd2in7::{DEFAULT_BACKGROUND_COLOR, HEIGHT, IMAGE_SIZE, WIDTH};

/// Display rotation, only 90° increments supported
#[derive(Default, Clone, Copy)]
pub enum DisplayRotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate by 90 degrees clockwise
    Rotate90,
    /// Rotate by 180 degrees clockwise
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

/// Full size frame buffer for the 2.7" panel
///
/// One bit per pixel, a set bit being a white pixel, rows stored top to
/// bottom with the most significant bit leftmost.
pub struct Display2in7 {
    buffer: [u8; IMAGE_SIZE],
    rotation: DisplayRotation,
}

impl Default for Display2in7 {
    fn default() -> Self {
        Display2in7 {
            buffer: [DEFAULT_BACKGROUND_COLOR.get_byte_value(); IMAGE_SIZE],
            rotation: DisplayRotation::default(),
        }
    }
}

impl Display2in7 {
    /// Returns the buffer in the layout the panel driver expects
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Sets the rotation applied to subsequent drawing operations
    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.rotation = rotation;
    }

    /// Returns the current rotation
    pub fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    /// Fills the whole buffer with one color
    pub fn clear_buffer(&mut self, color: Color) {
        for byte in &mut self.buffer {
            *byte = color.get_byte_value();
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let (x, y) = match self.rotation {
            DisplayRotation::Rotate0 => (x, y),
            DisplayRotation::Rotate90 => (WIDTH - 1 - y, x),
            DisplayRotation::Rotate180 => (WIDTH - 1 - x, HEIGHT - 1 - y),
            DisplayRotation::Rotate270 => (y, HEIGHT - 1 - x),
        };
        let index = y as usize * (WIDTH as usize / 8) + x as usize / 8;
        self.buffer[index].set_bit(7 - x as usize % 8, color == Color::White);
    }
}

impl DrawTarget for Display2in7 {
    type Color = Color;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let size = self.size();
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < size.width
                && (point.y as u32) < size.height
            {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Display2in7 {
    fn size(&self) -> Size {
        match self.rotation {
            DisplayRotation::Rotate0 | DisplayRotation::Rotate180 => Size::new(WIDTH, HEIGHT),
            DisplayRotation::Rotate90 | DisplayRotation::Rotate270 => Size::new(HEIGHT, WIDTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        prelude::*,
        primitives::{Line, PrimitiveStyle},
    };

    #[test]
    fn graphics_size() {
        let display = Display2in7::default();
        assert_eq!(display.buffer().len(), 5808);
        assert_eq!(display.size(), Size::new(264, 176));
    }

    // the default background is white on every byte
    #[test]
    fn graphics_default() {
        let display = Display2in7::default();
        for &byte in display.buffer() {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    #[test]
    fn graphics_rotation_0() {
        let mut display = Display2in7::default();
        let _ = Line::new(Point::new(0, 0), Point::new(7, 0))
            .into_styled(PrimitiveStyle::with_stroke(Color::Black, 1))
            .draw(&mut display);

        let buffer = display.buffer();
        assert_eq!(buffer[0], Color::Black.get_byte_value());
        for &byte in buffer.iter().skip(1) {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    #[test]
    fn graphics_rotation_90() {
        let mut display = Display2in7::default();
        display.set_rotation(DisplayRotation::Rotate90);
        assert_eq!(display.size(), Size::new(176, 264));

        let _ = Line::new(Point::new(0, 256), Point::new(0, 263))
            .into_styled(PrimitiveStyle::with_stroke(Color::Black, 1))
            .draw(&mut display);

        let buffer = display.buffer();
        assert_eq!(buffer[0], Color::Black.get_byte_value());
        for &byte in buffer.iter().skip(1) {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    #[test]
    fn graphics_rotation_180() {
        let mut display = Display2in7::default();
        display.set_rotation(DisplayRotation::Rotate180);

        let _ = Line::new(Point::new(256, 175), Point::new(263, 175))
            .into_styled(PrimitiveStyle::with_stroke(Color::Black, 1))
            .draw(&mut display);

        let buffer = display.buffer();
        assert_eq!(buffer[0], Color::Black.get_byte_value());
        for &byte in buffer.iter().skip(1) {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    #[test]
    fn graphics_rotation_270() {
        let mut display = Display2in7::default();
        display.set_rotation(DisplayRotation::Rotate270);
        assert_eq!(display.size(), Size::new(176, 264));

        let _ = Line::new(Point::new(175, 0), Point::new(175, 7))
            .into_styled(PrimitiveStyle::with_stroke(Color::Black, 1))
            .draw(&mut display);

        let buffer = display.buffer();
        assert_eq!(buffer[0], Color::Black.get_byte_value());
        for &byte in buffer.iter().skip(1) {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    // pixels outside the visible area are dropped
    #[test]
    fn graphics_out_of_bounds() {
        let mut display = Display2in7::default();
        let _ = Line::new(Point::new(-10, -10), Point::new(-1, -1))
            .into_styled(PrimitiveStyle::with_stroke(Color::Black, 1))
            .draw(&mut display);

        for &byte in display.buffer() {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }

    #[test]
    fn graphics_clear_buffer() {
        let mut display = Display2in7::default();
        display.clear_buffer(Color::Black);
        for &byte in display.buffer() {
            assert_eq!(byte, Color::Black.get_byte_value());
        }
        display.clear_buffer(Color::White);
        for &byte in display.buffer() {
            assert_eq!(byte, Color::White.get_byte_value());
        }
    }
}
