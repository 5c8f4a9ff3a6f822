use bitflags::bitflags;

pub mod controller;
pub mod jtag_state_machine;
pub mod signal;
pub mod tap;

/// Physical pin number on the port.
pub type JtagPin = u8;

bitflags! {
    /// A set of JTAG signals.
    #[derive(Default)]
    pub struct JtagBit: u8 {
        const TCK = 1 << 0;
        const TMS = 1 << 1;
        const TDI = 1 << 2;
        const TDO = 1 << 3;
        const TRST = 1 << 4;

        /// Signals the adapter drives.
        const OUTPUTS = Self::TCK.bits | Self::TMS.bits | Self::TDI.bits | Self::TRST.bits;
    }
}
