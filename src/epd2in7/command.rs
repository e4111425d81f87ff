//! Register file of the G2 chip-on-glass driver on the 2.7" panel
use crate::traits;

/// Epd2in7 register indexes
///
/// Should rarely (never?) be needed directly.
///
/// The G2 chip-on-glass driver has no command stream: the host selects one of
/// these registers inside an index frame and then writes or reads its payload
/// in a second frame. See the Pervasive Displays COG driver interface
/// document for the details of each register.
#[allow(dead_code)]
#[derive(Copy, Clone)]
pub(crate) enum Command {
    /// Selects which of the gate driver channels are active.
    ///
    /// The 2.7" panel uses the fixed eight byte pattern from
    /// [`CHANNEL_SELECT_DATA`](super::constants::CHANNEL_SELECT_DATA).
    ChannelSelect = 0x01,
    /// Output enable of the source driver outputs.
    ///
    /// `0x40` disconnects the outputs, `0x07` drives the latched line onto
    /// the panel.
    OutputEnable = 0x02,
    /// Latches the shifted line into the output stage
    LatchEnable = 0x03,
    /// Gate and source voltage level select.
    ///
    /// Doubles as the SPI-commanded discharge register during power-off
    /// (`0x80`).
    GateSourceLevel = 0x04,
    /// Charge pump control, staged VGH/VDH, VGL/VDL and VCOM drive enables
    ChargePump = 0x05,
    /// Oscillator setting, `0xD1` runs, `0x01` stops the clock
    OscillatorSetting = 0x07,
    /// Power setting of the internal regulators
    PowerSetting = 0x08,
    /// VCOM level select
    VcomLevel = 0x09,
    /// Takes one full encoded line (scan bytes, data bytes, dummy byte) into
    /// the shift register
    PixelData = 0x0A,
    /// Power saving mode
    PowerSaving = 0x0B,
    /// Status register carrying the breakage flag and the charge pump DC
    /// level flag
    Status = 0x0F,
}

impl traits::Command for Command {
    /// Returns the register index of the command
    fn address(self) -> u8 {
        self as u8
    }
}
