use core::marker::PhantomData;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::{Operation, SpiDevice},
};

use crate::error::Error;
use crate::traits::{Command, Monotonic};

/// Header byte opening the register-index frame (`0x70`)
const REG_INDEX_HEADER: u8 = 0x70;
/// Header byte opening a register data-write frame (`0x72`)
const REG_DATA_WRITE: u8 = 0x72;
/// Header byte opening a register data-read frame (`0x73`)
const REG_DATA_READ: u8 = 0x73;
/// Header byte of the unframed driver-id read (`0x71`)
const REG_DRIVER_ID: u8 = 0x71;

/// Sleep between two polls of the busy line
const BUSY_POLL_DELAY_US: u32 = 10;

/// The control lines of a chip-on-glass panel, resolved once at startup.
///
/// The chip-select line is not part of this set: it frames every SPI
/// transaction and therefore belongs to the [`SpiDevice`] implementation the
/// caller hands in per call.
pub struct ControlPins<INPUT, OUTPUT>
where
    INPUT: InputPin,
    OUTPUT: OutputPin,
{
    /// Busy signal from the panel, asserted while the gate drivers settle
    pub busy: INPUT,
    /// Reset signal to the chip-on-glass driver
    pub reset: OUTPUT,
    /// Shorts the panel storage capacitor to ground during power-off
    pub discharge: OUTPUT,
    /// Switches the panel supply rail
    pub panel_on: OUTPUT,
    /// Drives the border electrode around the active area
    pub border: OUTPUT,
    /// Enables the level shifter between host and panel
    pub io_enable: OUTPUT,
}

/// Returned by [`DisplayInterface::wait_while_busy`] when the busy line
/// stayed asserted beyond the bound
pub(crate) struct BusyWaitExpired;

/// The connection interface of the Pervasive chip-on-glass panels.
///
/// These panels have no data/command pin. Every register access is framed on
/// the wire instead: one chip-select frame carrying the register index behind
/// a `0x70` header, then a second frame carrying the payload behind a `0x72`
/// (write) or `0x73` (read) header.
pub(crate) struct DisplayInterface<SPI, INPUT, OUTPUT>
where
    INPUT: InputPin,
    OUTPUT: OutputPin,
{
    /// SPI
    _spi: PhantomData<SPI>,
    /// Control and status lines
    pins: ControlPins<INPUT, OUTPUT>,
}

impl<SPI, INPUT, OUTPUT> DisplayInterface<SPI, INPUT, OUTPUT>
where
    SPI: SpiDevice,
    INPUT: InputPin,
    OUTPUT: OutputPin,
{
    /// Creates a new `DisplayInterface` over the resolved control lines
    pub fn new(pins: ControlPins<INPUT, OUTPUT>) -> Self {
        DisplayInterface {
            _spi: PhantomData,
            pins,
        }
    }

    /// Writes `data` to the register selected by `command`
    pub(crate) fn write_register<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
        data: &[u8],
    ) -> Result<(), Error<SPI::Error>> {
        self.select_register(spi, command)?;

        // header and payload have to share one chip-select frame
        spi.transaction(&mut [
            Operation::Write(&[REG_DATA_WRITE]),
            Operation::Write(data),
        ])
        .map_err(Error::Spi)
    }

    /// Reads one byte back from the register selected by `command`
    pub(crate) fn read_register<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
    ) -> Result<u8, Error<SPI::Error>> {
        self.select_register(spi, command)?;

        let mut frame = [REG_DATA_READ, 0x00];
        spi.transfer_in_place(&mut frame).map_err(Error::Spi)?;
        Ok(frame[1])
    }

    /// Reads the chip-on-glass driver id.
    ///
    /// This is the one register access that skips the index frame: the id
    /// comes back directly behind the `0x71` header.
    pub(crate) fn read_driver_id(&mut self, spi: &mut SPI) -> Result<u8, Error<SPI::Error>> {
        let mut frame = [REG_DRIVER_ID, 0x00];
        spi.transfer_in_place(&mut frame).map_err(Error::Spi)?;
        Ok(frame[1])
    }

    fn select_register<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
    ) -> Result<(), Error<SPI::Error>> {
        spi.write(&[REG_INDEX_HEADER, command.address()])
            .map_err(Error::Spi)
    }

    /// Checks if the panel is still settling its gate drivers
    pub(crate) fn is_busy(&mut self) -> bool {
        self.pins.busy.is_high().unwrap_or(false)
    }

    /// Polls the busy line until it clears, bounded by `timeout_ms`.
    ///
    /// The bound is measured against the injected tick source and the polling
    /// pace against the injected delay, so neither depends on a process-wide
    /// timer.
    pub(crate) fn wait_while_busy<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        delay: &mut DELAY,
        clock: &mut CLK,
        timeout_ms: u32,
    ) -> Result<(), BusyWaitExpired> {
        let start = clock.ticks_ms();
        while self.is_busy() {
            if clock.ticks_ms().wrapping_sub(start) > timeout_ms {
                return Err(BusyWaitExpired);
            }
            delay.delay_us(BUSY_POLL_DELAY_US);
        }
        Ok(())
    }

    /// Drives the reset line
    pub(crate) fn set_reset(&mut self, high: bool) {
        let _ = self.pins.reset.set_state(high.into());
    }

    /// Drives the discharge line
    pub(crate) fn set_discharge(&mut self, high: bool) {
        let _ = self.pins.discharge.set_state(high.into());
    }

    /// Switches the panel supply rail
    pub(crate) fn set_panel_power(&mut self, on: bool) {
        let _ = self.pins.panel_on.set_state(on.into());
    }

    /// Drives the border electrode
    pub(crate) fn set_border(&mut self, high: bool) {
        let _ = self.pins.border.set_state(high.into());
    }

    /// Enables or disables the level shifter
    pub(crate) fn set_io_enable(&mut self, on: bool) {
        let _ = self.pins.io_enable.set_state(on.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinLevel, Transaction as PinTransaction,
    };

    // Steps one millisecond per reading
    struct FakeClock {
        now: u32,
    }

    impl Monotonic for FakeClock {
        fn ticks_ms(&mut self) -> u32 {
            self.now = self.now.wrapping_add(1);
            self.now
        }
    }

    type TestSpi = embedded_hal_mock::eh1::spi::Mock<u8>;

    fn interface_with_busy(busy: PinMock) -> DisplayInterface<TestSpi, PinMock, PinMock> {
        // The busy-handshake tests only exercise the busy pin; the remaining
        // control pins carry no expectations, so satisfy the mock's drop-time
        // `.done()` check for them up front.
        let mut reset = PinMock::new(&[]);
        let mut discharge = PinMock::new(&[]);
        let mut panel_on = PinMock::new(&[]);
        let mut border = PinMock::new(&[]);
        let mut io_enable = PinMock::new(&[]);
        reset.done();
        discharge.done();
        panel_on.done();
        border.done();
        io_enable.done();
        DisplayInterface::new(ControlPins {
            busy,
            reset,
            discharge,
            panel_on,
            border,
            io_enable,
        })
    }

    #[test]
    fn busy_wait_returns_once_line_clears() {
        let expectations = [
            PinTransaction::get(PinLevel::High),
            PinTransaction::get(PinLevel::High),
            PinTransaction::get(PinLevel::Low),
        ];
        let busy = PinMock::new(&expectations);
        let mut busy_handle = busy.clone();

        let mut interface = interface_with_busy(busy);
        let mut clock = FakeClock { now: 0 };
        let result = interface.wait_while_busy(&mut NoopDelay::new(), &mut clock, 10);

        assert!(result.is_ok());
        busy_handle.done();
    }

    #[test]
    fn busy_wait_expires_on_a_held_line() {
        // bound of 2 ms with a clock stepping 1 ms per poll: three busy polls
        let expectations = [
            PinTransaction::get(PinLevel::High),
            PinTransaction::get(PinLevel::High),
            PinTransaction::get(PinLevel::High),
        ];
        let busy = PinMock::new(&expectations);
        let mut busy_handle = busy.clone();

        let mut interface = interface_with_busy(busy);
        let mut clock = FakeClock { now: 0 };
        let result = interface.wait_while_busy(&mut NoopDelay::new(), &mut clock, 2);

        assert!(result.is_err());
        busy_handle.done();
    }

    #[test]
    fn busy_pin_low_means_idle() {
        let expectations = [PinTransaction::get(PinLevel::Low)];
        let busy = PinMock::new(&expectations);
        let mut busy_handle = busy.clone();

        let mut interface = interface_with_busy(busy);
        assert!(!interface.is_busy());
        busy_handle.done();
    }
}
