//! STM32 style GPIO port driven through its configuration registers.
//!
//! Each register is modelled with `bitfield` so that configuring one pin
//! reads the register, changes that pin's field and writes it back, leaving
//! every other pin's bits as they were. Output levels go through BSRR, which
//! sets or resets pins without a read-modify-write.

use bitfield::bitfield;
use log::trace;

use crate::interface::{GpioPort, PinConfig, PinMode};
use crate::jtag::JtagPin;

/// Pins on one GPIO port.
pub const GPIO_PINS: u8 = 16;

/// GPIOD on STM32F3.
pub const GPIOD_BASE: usize = 0x4800_0C00;
pub const RCC_BASE: usize = 0x4002_1000;

bitfield! {
    pub struct Moder(u32);
    impl Debug;
    pub u8, mode, set_mode: 1, 0, 16;
}

bitfield! {
    pub struct Otyper(u32);
    impl Debug;
    pub u8, output_type, set_output_type: 0, 0, 16;
}

bitfield! {
    pub struct Ospeedr(u32);
    impl Debug;
    pub u8, speed, set_speed: 1, 0, 16;
}

bitfield! {
    pub struct Pupdr(u32);
    impl Debug;
    pub u8, pull, set_pull: 1, 0, 16;
}

bitfield! {
    pub struct Idr(u32);
    impl Debug;
    pub u8, level, _: 0, 0, 16;
}

bitfield! {
    pub struct Bsrr(u32);
    impl Debug;
    pub u8, bs, set_bs: 0, 0, 16;
    pub u8, br, set_br: 16, 16, 16;
}

bitfield! {
    pub struct AhbEnr(u32);
    impl Debug;
    pub gpioden, set_gpioden: 20;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Moder,
    Otyper,
    Ospeedr,
    Pupdr,
    Idr,
    Odr,
    Bsrr,
    AhbEnr,
}

impl Register {
    pub const COUNT: usize = 8;

    /// Byte offset from the peripheral base the register belongs to.
    pub fn offset(self) -> usize {
        match self {
            Register::Moder => 0x00,
            Register::Otyper => 0x04,
            Register::Ospeedr => 0x08,
            Register::Pupdr => 0x0C,
            Register::Idr => 0x10,
            Register::Odr => 0x14,
            Register::Bsrr => 0x18,
            Register::AhbEnr => 0x14,
        }
    }
}

/// Raw 32-bit access to the GPIO and RCC registers.
pub trait RegisterBlock {
    fn read(&self, reg: Register) -> u32;
    fn write(&mut self, reg: Register, value: u32);
}

/// Memory mapped registers of a real device.
pub struct Mmio {
    gpio_base: usize,
    rcc_base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `gpio_base` and `rcc_base` must be the addresses of a GPIO port and
    /// of the RCC block, and nothing else may hold them.
    pub const unsafe fn new(gpio_base: usize, rcc_base: usize) -> Self {
        Mmio {
            gpio_base,
            rcc_base,
        }
    }

    /// # Safety
    ///
    /// See [`Mmio::new`].
    pub const unsafe fn gpiod() -> Self {
        Mmio::new(GPIOD_BASE, RCC_BASE)
    }

    fn address(&self, reg: Register) -> *mut u32 {
        let base = match reg {
            Register::AhbEnr => self.rcc_base,
            _ => self.gpio_base,
        };
        (base + reg.offset()) as *mut u32
    }
}

impl RegisterBlock for Mmio {
    fn read(&self, reg: Register) -> u32 {
        // SAFETY: the addresses were vouched for in `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.address(reg)) }
    }

    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: the addresses were vouched for in `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.address(reg), value) }
    }
}

/// Register file kept in memory, for hosts and tests.
///
/// BSRR reads back the last value written to it and every write is applied
/// to ODR. IDR returns the ODR bit for pins in output mode and the value
/// poked with [`MemoryRegisters::set_inputs`] for everything else.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryRegisters {
    values: [u32; Register::COUNT],
}

impl MemoryRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary register contents.
    pub fn with_values(values: [u32; Register::COUNT]) -> Self {
        MemoryRegisters { values }
    }

    pub fn set_inputs(&mut self, levels: u32) {
        self.values[Register::Idr as usize] = levels;
    }

    /// Contents exactly as stored, without the IDR loopback.
    pub fn raw(&self, reg: Register) -> u32 {
        self.values[reg as usize]
    }
}

impl RegisterBlock for MemoryRegisters {
    fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::Idr => {
                let moder = Moder(self.values[Register::Moder as usize]);
                let outputs = (0..GPIO_PINS as usize)
                    .filter(|&pin| moder.mode(pin) == PinMode::Output as u8)
                    .fold(0u32, |mask, pin| mask | (1 << pin));
                (self.values[Register::Idr as usize] & !outputs)
                    | (self.values[Register::Odr as usize] & outputs)
            }
            _ => self.values[reg as usize],
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        if reg == Register::Bsrr {
            let odr = self.values[Register::Odr as usize];
            self.values[Register::Odr as usize] = (odr & !(value >> 16)) | (value & 0xFFFF);
        }
        self.values[reg as usize] = value;
    }
}

pub struct Stm32Gpio<R> {
    regs: R,
}

impl<R: RegisterBlock> Stm32Gpio<R> {
    pub fn new(regs: R) -> Self {
        Stm32Gpio { regs }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn into_inner(self) -> R {
        self.regs
    }
}

impl<R: RegisterBlock> GpioPort for Stm32Gpio<R> {
    fn pin_count(&self) -> u8 {
        GPIO_PINS
    }

    fn enable_clock(&mut self) {
        let mut enr = AhbEnr(self.regs.read(Register::AhbEnr));
        enr.set_gpioden(true);
        self.regs.write(Register::AhbEnr, enr.0);
    }

    fn set_direction(&mut self, pin: JtagPin, config: PinConfig) {
        let index = pin as usize;
        trace!("pin {} -> {:?}", pin, config);

        let mut otyper = Otyper(self.regs.read(Register::Otyper));
        otyper.set_output_type(index, config.output as u8);
        self.regs.write(Register::Otyper, otyper.0);

        let mut ospeedr = Ospeedr(self.regs.read(Register::Ospeedr));
        ospeedr.set_speed(index, config.speed as u8);
        self.regs.write(Register::Ospeedr, ospeedr.0);

        let mut pupdr = Pupdr(self.regs.read(Register::Pupdr));
        pupdr.set_pull(index, config.pull as u8);
        self.regs.write(Register::Pupdr, pupdr.0);

        // mode last, so an output comes up with the type and speed above
        let mut moder = Moder(self.regs.read(Register::Moder));
        moder.set_mode(index, config.mode as u8);
        self.regs.write(Register::Moder, moder.0);
    }

    fn drive(&mut self, pin: JtagPin, high: bool) {
        let mut bsrr = Bsrr(0);
        if high {
            bsrr.set_bs(pin as usize, 1);
        } else {
            bsrr.set_br(pin as usize, 1);
        }
        self.regs.write(Register::Bsrr, bsrr.0);
    }

    fn read(&mut self, pin: JtagPin) -> bool {
        Idr(self.regs.read(Register::Idr)).level(pin as usize) != 0
    }
}
