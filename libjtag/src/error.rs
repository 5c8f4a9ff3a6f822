//! Errors reported when assigning JTAG signals to pins.
//!
//! Everything else in this crate is infallible, so the taxonomy is small and
//! `Copy`, and works without `std`.

use core::fmt;

use crate::jtag::signal::SignalId;
use crate::jtag::JtagPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Requested pin is outside the port.
    InvalidPin { pin: JtagPin, pin_count: u8 },
    /// Requested pin already carries another signal.
    PinUnavailable { pin: JtagPin, owner: SignalId },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin { pin, pin_count } => {
                write!(f, "pin {} is out of range (port has {} pins)", pin, pin_count)
            }
            Self::PinUnavailable { pin, owner } => {
                write!(f, "pin {} is already allocated to {}", pin, owner)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
