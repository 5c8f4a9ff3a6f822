use crate::jtag::JtagPin;

#[cfg(feature = "ftdi")]
pub mod ftdi_bitbang;
pub mod stm32;

#[cfg(test)]
pub(crate) mod mock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    Input = 0b00,
    Output = 0b01,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputType {
    PushPull = 0,
    OpenDrain = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Speed {
    Low = 0b00,
    Medium = 0b01,
    High = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Pull {
    None = 0b00,
    Up = 0b01,
    Down = 0b10,
}

/// Electrical configuration of a single pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub mode: PinMode,
    pub output: OutputType,
    pub speed: Speed,
    pub pull: Pull,
}

impl PinConfig {
    /// Push-pull, low speed, no pull resistor.
    pub const OUTPUT: PinConfig = PinConfig {
        mode: PinMode::Output,
        output: OutputType::PushPull,
        speed: Speed::Low,
        pull: Pull::None,
    };

    /// Floating input.
    pub const INPUT: PinConfig = PinConfig {
        mode: PinMode::Input,
        output: OutputType::PushPull,
        speed: Speed::Low,
        pull: Pull::None,
    };
}

/// Pin level access for the port the JTAG signals are wired to.
///
/// Implementations must only touch the addressed pin; `drive` in particular
/// has to be atomic with respect to the other pins of the port.
pub trait GpioPort {
    /// Number of addressable pins, at most 32.
    fn pin_count(&self) -> u8;
    /// Enable the port's peripheral clock without clearing other enables.
    fn enable_clock(&mut self);
    fn set_direction(&mut self, pin: JtagPin, config: PinConfig);
    fn drive(&mut self, pin: JtagPin, high: bool);
    fn read(&mut self, pin: JtagPin) -> bool;
}
