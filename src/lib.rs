//! A simple Driver for the Pervasive Displays E-Ink panels via SPI
//!
//! This driver was built using [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/~1
//!
//! # Requirements
//!
//! ### SPI
//!
//! - SPI_MODE_0 is used (CPHL = 0, CPOL = 0)
//! - 8 bits per word, MSB first
//! - The panel has no data/command pin: every register access is framed
//!   with a header byte on the wire, so chip-select must frame each
//!   transaction. Hand the driver an [`SpiDevice`](embedded_hal::spi::SpiDevice)
//!   that owns the chip-select line (for example
//!   `embedded_hal_bus::spi::ExclusiveDevice`).
//!
//! ### Other
//!
//! - The panel carries no frame memory of its own: the host replays the
//!   whole waveform, so a refresh takes up to a few seconds and the
//!   driver blocks for that time.
//! - Buffersize: the frame buffer always needs to be of the size
//!   `width / 8 * height` of the full panel.
//! - A millisecond tick source implementing [`Monotonic`](prelude::Monotonic)
//!   is needed to bound the waveform stages and the busy handshake.
//!
//! # Example
//!
//! ```ignore
//! use epd_pervasive::{epd2in7::*, prelude::*};
//!
//! let pins = ControlPins { busy, reset, discharge, panel_on, border, io_enable };
//! let mut epd = Epd2in7::new(pins);
//!
//! let mut display = Display2in7::default();
//!
//! // draw something into the buffer with embedded-graphics, then:
//!
//! epd.power_on(&mut spi, &mut delay, &mut clock)?;
//! epd.update_frame(&mut spi, &mut delay, &mut clock, display.buffer(), UpdateMode::Full, 23)?;
//! epd.power_off(&mut spi, &mut delay)?;
//! ```
#![no_std]

#[cfg(feature = "graphics")]
pub mod graphics;

mod traits;

pub mod color;

pub mod error;

/// Interface for the physical connection between display and the controlling device
mod interface;

pub mod epd2in7;

pub use crate::interface::ControlPins;
pub use crate::traits::{Monotonic, PanelState, PervasiveDisplay, SelfTest, UpdateMode};

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::error::{Error, SelfTestCheck};
    pub use crate::interface::ControlPins;
    pub use crate::traits::{Monotonic, PanelState, PervasiveDisplay, SelfTest, UpdateMode};
    pub use crate::SPI_MODE;

    #[cfg(feature = "graphics")]
    pub use crate::graphics::DisplayRotation;
}

use embedded_hal::spi::{Mode, Phase, Polarity};

/// SPI mode -
/// For more infos see [Requirements: SPI](index.html#spi)
pub const SPI_MODE: Mode = Mode {
    phase: Phase::CaptureOnFirstTransition,
    polarity: Polarity::IdleLow,
};

/// Computes the needed buffer length. Takes care of rounding up in case width
/// is not divisible by 8.
pub const fn buffer_len(width: usize, height: usize) -> usize {
    (width + 7) / 8 * height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_lengths() {
        assert_eq!(buffer_len(264, 176), 5808);
        assert_eq!(buffer_len(10, 10), 20);
    }
}
