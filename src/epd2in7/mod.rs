//! A simple Driver for the Pervasive Displays 2.7" E-Ink panel (E2271CS021)
//! via SPI
//!
//! The panel carries only the chip-on-glass shift register of its row and
//! column drivers: there is no frame memory and no refresh controller on the
//! glass. The host replays the whole waveform for every refresh, from the
//! staged power-up with its self-test handshake over the repeated
//! temperature-compensated sweeps of all 176 lines down to the ordered
//! discharge sequence on power-off.
//!
//! [Documentation](https://www.pervasivedisplays.com/products/271)
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
//! // draw something into the buffer with embedded-graphics
//!
//! epd.power_on(&mut spi, &mut delay, &mut clock)?;
//! epd.update_frame(&mut spi, &mut delay, &mut clock, display.buffer(), UpdateMode::Full, 23)?;
//! epd.power_off(&mut spi, &mut delay)?;
//! ```

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};

use crate::buffer_len;
use crate::color::Color;
use crate::error::{Error, SelfTestCheck};
use crate::interface::{ControlPins, DisplayInterface};
use crate::traits::{Monotonic, PanelState, PervasiveDisplay, SelfTest, UpdateMode};

pub(crate) mod command;
pub(crate) mod constants;
mod line;

use self::command::Command;
use self::constants::*;
use self::line::{LineBuffer, RowSource};

/// Width of the display
pub const WIDTH: u32 = 264;
/// Height of the display
pub const HEIGHT: u32 = 176;
/// Size of the full frame buffer in bytes
pub const IMAGE_SIZE: usize = buffer_len(WIDTH as usize, HEIGHT as usize);
/// Default Background Color
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::White;

/// Full size buffer for use with the 2.7" panel
#[cfg(feature = "graphics")]
pub use crate::graphics::Display2in7;

/// One sweep over all panel lines with a single waveform purpose
#[derive(Copy, Clone)]
enum Stage {
    /// Uniform all-black sweep erasing the previous image state
    Compensate,
    /// Uniform all-white sweep
    White,
    /// The target image with every pixel driven to its opposite color
    Inverse,
    /// The target image
    Normal,
}

const FULL_STAGES: &[Stage] = &[Stage::Compensate, Stage::White, Stage::Inverse, Stage::Normal];
const PARTIAL_STAGES: &[Stage] = &[Stage::Normal];

fn scaling(mode: UpdateMode) -> u8 {
    match mode {
        UpdateMode::Full => SCALING_FULL,
        UpdateMode::Partial => SCALING_PARTIAL,
    }
}

/// Epd2in7 driver
///
/// Owns the control pins and the panel session; the SPI device, the delay
/// provider and the tick source are borrowed per call.
pub struct Epd2in7<SPI, INPUT, OUTPUT>
where
    INPUT: InputPin,
    OUTPUT: OutputPin,
{
    /// Connection Interface
    interface: DisplayInterface<SPI, INPUT, OUTPUT>,
    /// Reused line encoding buffer
    line: LineBuffer,
    /// Power state of the session
    state: PanelState,
    /// Record of the most recent power-up self-test
    self_test: Option<SelfTest>,
    /// Bound on one busy handshake
    busy_timeout_ms: u32,
}

impl<SPI, INPUT, OUTPUT> Epd2in7<SPI, INPUT, OUTPUT>
where
    SPI: SpiDevice,
    INPUT: InputPin,
    OUTPUT: OutputPin,
{
    /// Creates the driver over the resolved control lines.
    ///
    /// The panel stays unpowered until
    /// [`power_on`](PervasiveDisplay::power_on) is called.
    pub fn new(pins: ControlPins<INPUT, OUTPUT>) -> Self {
        Epd2in7 {
            interface: DisplayInterface::new(pins),
            line: LineBuffer::new(),
            state: PanelState::Off,
            self_test: None,
            busy_timeout_ms: MAX_BUSY_TIME_MS,
        }
    }

    fn run_power_on<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        report: &mut SelfTest,
    ) -> Result<(), Error<SPI::Error>> {
        self.interface.set_io_enable(true);
        self.interface.set_panel_power(true);
        delay.delay_ms(PWR_DELAY_MS);

        self.interface.set_border(true);
        self.interface.set_reset(true);
        delay.delay_ms(PIN_DELAY_MS);
        self.interface.set_reset(false);
        delay.delay_ms(PIN_DELAY_MS);
        self.interface.set_reset(true);
        delay.delay_ms(PIN_DELAY_MS);

        if self
            .interface
            .wait_while_busy(delay, clock, self.busy_timeout_ms)
            .is_err()
        {
            return Err(Error::BusyTimeout { stage: 0, line: 0 });
        }

        let id = self.interface.read_driver_id(spi)?;
        report.driver_id_valid = DRIVER_ID_CHECK.passes(id);
        if !report.driver_id_valid {
            return Err(Error::SelfTest(SelfTestCheck::DriverId));
        }

        self.interface
            .write_register(spi, Command::OutputEnable, &[OUTPUT_ENABLE_OFF_DATA])?;

        let status = self.interface.read_register(spi, Command::Status)?;
        report.breakage_detected = !BREAKAGE_CHECK.passes(status);
        if report.breakage_detected {
            return Err(Error::SelfTest(SelfTestCheck::Breakage));
        }

        self.interface
            .write_register(spi, Command::PowerSaving, &[POWER_SAVING_ON_DATA])?;
        self.interface
            .write_register(spi, Command::ChannelSelect, &CHANNEL_SELECT_DATA)?;
        self.interface
            .write_register(spi, Command::OscillatorSetting, &[OSCILLATOR_RUN_DATA])?;
        self.interface
            .write_register(spi, Command::PowerSetting, &[POWER_SETTING_DATA])?;
        self.interface
            .write_register(spi, Command::VcomLevel, &[VCOM_LEVEL_DATA])?;
        self.interface
            .write_register(spi, Command::GateSourceLevel, &[GATE_SOURCE_LEVEL_DATA])?;

        self.interface
            .write_register(spi, Command::LatchEnable, &[LATCH_ON_DATA])?;
        delay.delay_ms(PIN_DELAY_MS);
        self.interface
            .write_register(spi, Command::LatchEnable, &[LATCH_OFF_DATA])?;

        // the charge pump needs up to four staging rounds before the DC
        // bias settles
        for _ in 0..CHARGE_PUMP_MAX_WRITE {
            self.interface
                .write_register(spi, Command::ChargePump, &[CHARGE_PUMP_VGH_VDH_ON_DATA])?;
            delay.delay_ms(POSITIVE_V_DELAY_MS);
            self.interface
                .write_register(spi, Command::ChargePump, &[CHARGE_PUMP_VGL_VDL_ON_DATA])?;
            delay.delay_ms(PWR_CTRL_DELAY_MS);
            self.interface
                .write_register(spi, Command::ChargePump, &[CHARGE_PUMP_VCOM_ON_DATA])?;
            delay.delay_ms(PWR_CTRL_DELAY_MS);

            let status = self.interface.read_register(spi, Command::Status)?;
            if DC_LEVEL_CHECK.passes(status) {
                report.dc_level_ok = true;
                break;
            }
        }
        if !report.dc_level_ok {
            return Err(Error::SelfTest(SelfTestCheck::DcLevel));
        }

        Ok(())
    }

    /// The discharge sequence never aborts: leaving residual charge on the
    /// panel storage capacitor can damage the glass, so register writes that
    /// fail are skipped over and the pin sequence still runs to the end.
    fn run_discharge<DELAY: DelayNs>(&mut self, spi: &mut SPI, delay: &mut DELAY) {
        self.interface.set_border(false);
        delay.delay_ms(BORDER_DELAY_MS);

        let _ = self
            .interface
            .write_register(spi, Command::VcomLevel, &[VCOM_DISCHARGE_DATA]);
        let _ = self
            .interface
            .write_register(spi, Command::PowerSaving, &[POWER_SAVING_OFF_DATA]);
        let _ = self
            .interface
            .write_register(spi, Command::OscillatorSetting, &[OSCILLATOR_OFF_DATA]);
        let _ = self
            .interface
            .write_register(spi, Command::ChargePump, &[CHARGE_PUMP_OFF_DATA]);
        let _ = self
            .interface
            .write_register(spi, Command::GateSourceLevel, &[DISCHARGE_SPI_DATA]);
        delay.delay_ms(DISCH_SPI_DELAY_MS);

        self.interface.set_panel_power(false);
        delay.delay_ms(PWR_OFF_DELAY_MS);
        self.interface.set_reset(false);
        delay.delay_ms(CS_OFF_DELAY_MS);

        self.interface.set_discharge(true);
        delay.delay_ms(DISCHARGE_DELAY_MS);
        self.interface.set_discharge(false);

        self.interface.set_io_enable(false);
        delay.delay_ms(DETACH_DELAY_MS);
    }

    fn run_update<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: Option<&[u8]>,
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>> {
        let result = self.drive_stages(spi, delay, clock, buffer, mode, celsius);
        if result.is_err() {
            // the panel is left half-driven, only a power cycle recovers it
            self.state = PanelState::Faulted;
        }
        result
    }

    fn drive_stages<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: Option<&[u8]>,
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>> {
        let stages = match mode {
            UpdateMode::Full => FULL_STAGES,
            UpdateMode::Partial => PARTIAL_STAGES,
        };
        let stage_time_ms =
            compensation_time_ms(celsius) * u32::from(scaling(mode)) + FRAME_TIME_OFFSET_MS;

        for (index, &stage) in stages.iter().enumerate() {
            let stage_number = index as u8 + 1;
            let started = clock.ticks_ms();
            loop {
                self.drive_frame_pass(spi, delay, clock, buffer, stage, stage_number)?;
                if clock.ticks_ms().wrapping_sub(started) >= stage_time_ms {
                    break;
                }
            }
        }

        // transmission-complete handshake: disconnect the source outputs
        self.interface
            .write_register(spi, Command::OutputEnable, &[OUTPUT_ENABLE_OFF_DATA])?;

        if mode == UpdateMode::Full {
            self.collapse_frame(spi, delay, clock, stages.len() as u8 + 1)?;
        }
        Ok(())
    }

    /// Drives every line of the panel once with the waveform of `stage`
    fn drive_frame_pass<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: Option<&[u8]>,
        stage: Stage,
        stage_number: u8,
    ) -> Result<(), Error<SPI::Error>> {
        for row in 0..VERTICAL_SIZE {
            let source = match stage {
                Stage::Compensate => RowSource::Uniform(ALL_BLACK),
                Stage::White => RowSource::Uniform(ALL_WHITE),
                Stage::Inverse | Stage::Normal => {
                    let invert = matches!(stage, Stage::Inverse);
                    match buffer {
                        Some(bits) => {
                            let start = row as usize * HORIZONTAL_SIZE;
                            RowSource::Pixels {
                                bits: &bits[start..start + HORIZONTAL_SIZE],
                                invert,
                            }
                        }
                        // no caller image: drive the panel towards white
                        None => RowSource::Uniform(if invert { ALL_BLACK } else { ALL_WHITE }),
                    }
                }
            };

            let encoded = self.line.encode(row, source);
            self.interface
                .write_register(spi, Command::PixelData, encoded)?;
            self.interface
                .write_register(spi, Command::OutputEnable, &[OUTPUT_ENABLE_ON_DATA])?;

            if self
                .interface
                .wait_while_busy(delay, clock, self.busy_timeout_ms)
                .is_err()
            {
                return Err(Error::BusyTimeout {
                    stage: stage_number,
                    line: row,
                });
            }
        }
        Ok(())
    }

    /// Settle pass after the last stage of a full update: one line with no
    /// gate line selected and every pixel on the no-change code, then a
    /// border pulse sharpening the edge of the active area.
    ///
    /// A busy timeout here reports the stage after the last waveform stage.
    fn collapse_frame<DELAY: DelayNs, CLK: Monotonic>(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        stage_number: u8,
    ) -> Result<(), Error<SPI::Error>> {
        let encoded = self.line.encode_settle();
        self.interface
            .write_register(spi, Command::PixelData, encoded)?;
        self.interface
            .write_register(spi, Command::OutputEnable, &[OUTPUT_ENABLE_ON_DATA])?;

        if self
            .interface
            .wait_while_busy(delay, clock, self.busy_timeout_ms)
            .is_err()
        {
            return Err(Error::BusyTimeout {
                stage: stage_number,
                line: 0,
            });
        }
        delay.delay_ms(DUMMY_LINE_DELAY_MS);

        self.interface.set_border(false);
        delay.delay_ms(BORDER_DELAY_MS);
        self.interface.set_border(true);
        Ok(())
    }
}

impl<SPI, INPUT, OUTPUT, DELAY, CLK> PervasiveDisplay<SPI, DELAY, CLK>
    for Epd2in7<SPI, INPUT, OUTPUT>
where
    SPI: SpiDevice,
    INPUT: InputPin,
    OUTPUT: OutputPin,
    DELAY: DelayNs,
    CLK: Monotonic,
{
    fn power_on(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
    ) -> Result<(), Error<SPI::Error>> {
        match self.state {
            PanelState::Off | PanelState::Faulted => {}
            _ => return Err(Error::NotReady),
        }
        self.state = PanelState::PoweringUp;

        let mut report = SelfTest::default();
        let result = self.run_power_on(spi, delay, clock, &mut report);
        self.self_test = Some(report);

        match result {
            Ok(()) => {
                self.state = PanelState::Ready;
                Ok(())
            }
            Err(fault) => {
                self.state = PanelState::Faulted;
                Err(fault)
            }
        }
    }

    fn power_off(&mut self, spi: &mut SPI, delay: &mut DELAY) -> Result<(), Error<SPI::Error>> {
        match self.state {
            PanelState::Ready | PanelState::Faulted => {}
            _ => return Err(Error::NotReady),
        }
        self.state = PanelState::PoweringDown;
        self.run_discharge(spi, delay);
        self.state = PanelState::Off;
        Ok(())
    }

    fn update_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: &[u8],
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>> {
        if self.state != PanelState::Ready {
            return Err(Error::NotReady);
        }
        if buffer.len() != IMAGE_SIZE {
            return Err(Error::InvalidBufferSize {
                expected: IMAGE_SIZE,
                found: buffer.len(),
            });
        }
        self.run_update(spi, delay, clock, Some(buffer), mode, celsius)
    }

    fn clear_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>> {
        if self.state != PanelState::Ready {
            return Err(Error::NotReady);
        }
        self.run_update(spi, delay, clock, None, UpdateMode::Full, celsius)
    }

    fn show_frame(
        &mut self,
        spi: &mut SPI,
        delay: &mut DELAY,
        clock: &mut CLK,
        buffer: &[u8],
        mode: UpdateMode,
        celsius: i8,
    ) -> Result<(), Error<SPI::Error>> {
        if self.state != PanelState::Ready {
            self.power_on(spi, delay, clock)?;
        }
        self.update_frame(spi, delay, clock, buffer, mode, celsius)?;
        <Epd2in7<SPI, INPUT, OUTPUT> as PervasiveDisplay<SPI, DELAY, CLK>>::power_off(self, spi, delay)
    }

    fn width(&self) -> u32 {
        WIDTH
    }

    fn height(&self) -> u32 {
        HEIGHT
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn self_test(&self) -> Option<SelfTest> {
        self.self_test
    }

    fn set_busy_timeout(&mut self, timeout_ms: u32) {
        self.busy_timeout_ms = timeout_ms;
    }
}
