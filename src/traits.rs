use crate::error::Error;
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

/// All commands need to have this trait which gives the register index of the
/// command which needs to be send via SPI inside the index frame
pub(crate) trait Command: Copy {
    fn address(self) -> u8;
}

/// Monotonic millisecond tick source.
///
/// The chip-on-glass panels have no internal refresh timing: the host decides
/// how long every waveform stage runs and how long it is willing to wait on
/// the busy handshake. Both bounds are measured against this tick source, so
/// a test can drive the driver with a fake clock instead of real hardware
/// delays.
pub trait Monotonic {
    /// Current tick count in milliseconds, wrapping on overflow
    fn ticks_ms(&mut self) -> u32;
}

/// Separates the two refresh strategies of the panel
///
/// A partial update assumes the panel content is the result of a recent full
/// update: it skips the ghosting-compensation sweeps and trades contrast for
/// speed. Issue a [`UpdateMode::Full`] update first after power-up.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub enum UpdateMode {
    /// The complete waveform: compensation, all-white and both image sweeps
    #[default]
    Full,
    /// The reduced waveform driving only the target image
    Partial,
}

/// Power state of the panel session
///
/// Updates are only accepted in [`PanelState::Ready`]. A session that faulted
/// must go through a full power-off/power-on cycle before it accepts work
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub enum PanelState {
    /// All supply rails down, chip-on-glass driver unpowered
    #[default]
    Off,
    /// Power-up sequence in flight
    PoweringUp,
    /// Powered, self-tested and accepting frame updates
    Ready,
    /// Discharge sequence in flight
    PoweringDown,
    /// A self-test check failed or an update timed out
    Faulted,
}

/// Outcome of the three power-up self-test exchanges
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub struct SelfTest {
    /// The driver id nibble matched the expected chip generation
    pub driver_id_valid: bool,
    /// The breakage test reported a cracked panel
    pub breakage_detected: bool,
    /// The charge pump reached the expected DC bias level
    pub dc_level_ok: bool,
}

/// All the functions to interact with the Pervasive chip-on-glass panels
///
/// The SPI device, the delay provider and the tick source are borrowed per
/// call, the driver itself only owns the control pins and the session state.
///
/// # Example
///
/// ```ignore
/// use epd_pervasive::{epd2in7::*, prelude::*};
///
/// let mut epd = Epd2in7::new(pins);
///
/// epd.power_on(&mut spi, &mut delay, &mut clock)?;
/// epd.update_frame(&mut spi, &mut delay, &mut clock, &buffer, UpdateMode::Full, 23)?;
/// epd.power_off(&mut spi, &mut delay)?;
/// ```
pub trait PervasiveDisplay<SPI, DELAY, CLK>
where
    SPI: SpiDevice,
    DELAY: DelayNs,
    CLK: Monotonic,
{
    /// Powers the panel up and runs the self-test handshake.
    ///
    /// Permitted from [`PanelState::Off`] and, as a full reset, from
    /// [`PanelState::Faulted`]. On success the session is
    /// [`PanelState::Ready`]; on any failing check it is
    /// [`PanelState::Faulted`] and the failing check is reported.
    fn power_on(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
    ) -> Result<(), Error<SPI::Error>>;

    /// Runs the ordered discharge sequence and powers the panel down.
    ///
    /// Once started the sequence always completes and the session always ends
    /// in [`PanelState::Off`]; residual charge on the storage capacitor can
    /// damage the panel, so no step of it is skipped on a transport error.
    fn power_off(&mut self, spi: &mut SPI, delay: &mut DELAY) -> Result<(), Error<SPI::Error>>;

    /// Drives one refresh of the panel from a 1 bit-per-pixel frame buffer.
    ///
    /// `celsius` is the ambient temperature; it selects how long every
    /// waveform stage must be held. The buffer is borrowed for the duration
    /// of the call only and must cover the whole panel.
    fn update_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: &[u8],
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>>;

    /// Drives a full refresh to all-white without a caller buffer
    fn clear_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>>;

    /// Complete power-cycled refresh: powers on if necessary, updates and
    /// powers off again
    fn show_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: &[u8],
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>>;

    /// Get the width of the display
    fn width(&self) -> u32;

    /// Get the height of the display
    fn height(&self) -> u32;

    /// Current power state of the panel session
    fn state(&self) -> PanelState;

    /// Self-test record of the most recent power-up, if one ran
    fn self_test(&self) -> Option<SelfTest>;

    /// Sets the bound on every busy-wait in milliseconds.
    ///
    /// A line whose busy handshake exceeds the bound aborts the update with
    /// [`Error::BusyTimeout`](crate::error::Error::BusyTimeout).
    fn set_busy_timeout(&mut self, timeout_ms: u32);
}
