#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

pub mod delay;
pub mod error;
pub mod interface;
pub mod jtag;

#[cfg(feature = "ftdi")]
pub use crate::interface::ftdi_bitbang;
pub use crate::jtag::controller::{JtagController, SharedJtag};
pub use crate::jtag::jtag_state_machine::TapState;
pub use crate::jtag::signal::SignalId;
