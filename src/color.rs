//! B/W color for the bilevel panels

/// Only for the B/W displays
///
/// The chip-on-glass driver follows the Pervasive convention: a set bit in the
/// frame buffer is a white pixel, a cleared bit is a black pixel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    /// Black ink
    Black,
    /// White background
    White,
}

impl Color {
    /// Get the color encoding of the color for one bit
    pub fn get_bit_value(self) -> u8 {
        match self {
            Color::White => 1u8,
            Color::Black => 0u8,
        }
    }

    /// Gets a full byte of black or white pixels
    pub fn get_byte_value(self) -> u8 {
        match self {
            Color::White => 0xff,
            Color::Black => 0x00,
        }
    }

    /// Returns the inverse of the color
    pub fn inverse(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => Color::Black,
            1 => Color::White,
            e => panic!("DisplayColor only parses 0 and 1 (Black and White) and not `{e}`"),
        }
    }
}

impl From<u8> for Color {
    fn from(value: u8) -> Self {
        Color::from_u8(value)
    }
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::pixelcolor::PixelColor for Color {
    type Raw = ();
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::BinaryColor> for Color {
    fn from(value: embedded_graphics_core::pixelcolor::BinaryColor) -> Self {
        use embedded_graphics_core::pixelcolor::BinaryColor;
        match value {
            BinaryColor::On => Color::Black,
            BinaryColor::Off => Color::White,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8() {
        assert_eq!(Color::Black, Color::from(0u8));
        assert_eq!(Color::White, Color::from(1u8));
    }

    // test all values aside from 0 and 1 which all should panic
    #[test]
    fn from_u8_panic() {
        for val in 2..=u8::MAX {
            extern crate std;
            let result = std::panic::catch_unwind(|| Color::from(val));
            assert!(result.is_err());
        }
    }

    #[test]
    fn u8_conversion() {
        assert_eq!(Color::from(Color::Black.get_bit_value()), Color::Black);
        assert_eq!(Color::from(Color::White.get_bit_value()), Color::White);
    }

    #[test]
    fn byte_values() {
        assert_eq!(Color::White.get_byte_value(), 0xff);
        assert_eq!(Color::Black.get_byte_value(), 0x00);
    }

    #[test]
    fn inverses() {
        assert_eq!(Color::White.inverse(), Color::Black);
        assert_eq!(Color::Black.inverse(), Color::White);
    }
}
