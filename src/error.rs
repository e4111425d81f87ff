//! Fault taxonomy of the panel session
//!
//! Every fault is reported synchronously to the caller of the failing
//! operation and leaves the session in exactly one documented
//! [`PanelState`](crate::traits::PanelState). The driver never retries on its
//! own: retrying inside an electrically staged sequence risks double-driving
//! the panel, so recovery is always an explicit power cycle by the caller.

use core::fmt::{self, Display, Formatter};

/// The power-up self-test exchange that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTestCheck {
    /// The driver id nibble did not match the expected chip generation
    DriverId,
    /// The breakage test flagged a cracked panel
    Breakage,
    /// The charge pump never reached the expected DC bias level
    DcLevel,
}

/// Everything that can go wrong while driving the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Encountered an SPI error
    Spi(E),

    /// A power-up self-test check failed its expected mask; the session is
    /// faulted and needs a full power cycle
    SelfTest(SelfTestCheck),

    /// The busy line stayed asserted beyond the configured bound.
    ///
    /// `stage` is the 1-based waveform stage and `line` the 0-based panel row
    /// that was being driven; stage 0 identifies the busy handshake of the
    /// power-up sequence. The session is faulted and needs a full power
    /// cycle; the panel may show a partially updated image until the next
    /// full update.
    BusyTimeout {
        /// 1-based waveform stage, 0 for the power-up handshake
        stage: u8,
        /// 0-based panel row
        line: u16,
    },

    /// The requested operation is not valid in the current session state.
    /// Nothing was sent to the panel and the state is unchanged.
    NotReady,

    /// The frame buffer does not match the panel geometry. Rejected before
    /// any transmission, so the panel keeps its previous image.
    InvalidBufferSize {
        /// Bytes the panel geometry requires
        expected: usize,
        /// Bytes the caller handed over
        found: usize,
    },
}

impl<E> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(_) => write!(f, "SPI transfer failed"),
            Self::SelfTest(SelfTestCheck::DriverId) => write!(f, "driver id mismatch"),
            Self::SelfTest(SelfTestCheck::Breakage) => write!(f, "panel breakage detected"),
            Self::SelfTest(SelfTestCheck::DcLevel) => write!(f, "charge pump DC level out of range"),
            Self::BusyTimeout { stage, line } => {
                write!(f, "busy timeout in stage {stage} at line {line}")
            }
            Self::NotReady => write!(f, "panel session is not in the required state"),
            Self::InvalidBufferSize { expected, found } => {
                write!(f, "frame buffer holds {found} bytes, panel needs {expected}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_display() {
        extern crate std;
        use std::string::ToString;

        let fault: Error<()> = Error::BusyTimeout { stage: 1, line: 10 };
        assert_eq!(fault.to_string(), "busy timeout in stage 1 at line 10");

        let fault: Error<()> = Error::InvalidBufferSize {
            expected: 5808,
            found: 0,
        };
        assert_eq!(
            fault.to_string(),
            "frame buffer holds 0 bytes, panel needs 5808"
        );
    }
}
