//! Mapping of the logical JTAG signals onto physical port pins.
//!
//! A signal is either unassigned or owns exactly one pin, and no pin carries
//! two signals. [`PinUsage`] mirrors the assignment table so that "is this pin
//! free" is a single mask test; every mutation in [`SignalMux`] updates both.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::interface::{GpioPort, PinConfig};
use crate::jtag::{JtagBit, JtagPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalId {
    Tck,
    Tms,
    Tdi,
    Tdo,
    /// Active low.
    Trst,
}

impl SignalId {
    pub const COUNT: usize = 5;
    pub const ALL: [SignalId; SignalId::COUNT] = [
        SignalId::Tck,
        SignalId::Tms,
        SignalId::Tdi,
        SignalId::Tdo,
        SignalId::Trst,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignalId::Tck => "TCK",
            SignalId::Tms => "TMS",
            SignalId::Tdi => "TDI",
            SignalId::Tdo => "TDO",
            SignalId::Trst => "TRST",
        }
    }

    pub fn bit(self) -> JtagBit {
        match self {
            SignalId::Tck => JtagBit::TCK,
            SignalId::Tms => JtagBit::TMS,
            SignalId::Tdi => JtagBit::TDI,
            SignalId::Tdo => JtagBit::TDO,
            SignalId::Trst => JtagBit::TRST,
        }
    }

    pub fn is_output(self) -> bool {
        JtagBit::OUTPUTS.contains(self.bit())
    }

    fn pin_config(self) -> PinConfig {
        if self.is_output() {
            PinConfig::OUTPUT
        } else {
            PinConfig::INPUT
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit mask of the pins currently claimed by a signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinUsage(u32);

impl PinUsage {
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, pin: JtagPin) -> bool {
        self.0 & (1 << pin) != 0
    }

    fn insert(&mut self, pin: JtagPin) {
        self.0 |= 1 << pin;
    }

    fn remove(&mut self, pin: JtagPin) {
        self.0 &= !(1 << pin);
    }
}

/// Power-on assignment: TCK, TMS, TDI and TDO on the first four pins.
const DEFAULT_ASSIGNMENT: [(SignalId, JtagPin); 4] = [
    (SignalId::Tck, 0),
    (SignalId::Tms, 1),
    (SignalId::Tdi, 2),
    (SignalId::Tdo, 3),
];

pub struct SignalMux<P> {
    port: P,
    assignment: [Option<JtagPin>; SignalId::COUNT],
    usage: PinUsage,
}

impl<P: GpioPort> SignalMux<P> {
    /// Wrap `port` and apply the default assignment.
    pub fn new(port: P) -> Self {
        let mut mux = SignalMux {
            port,
            assignment: [None; SignalId::COUNT],
            usage: PinUsage::default(),
        };
        mux.init();
        mux
    }

    /// Release every signal, then put TCK, TMS, TDI and TDO back on pins 0-3.
    pub fn init(&mut self) {
        self.port.enable_clock();
        self.release_all();

        for &(signal, pin) in DEFAULT_ASSIGNMENT.iter() {
            if let Err(err) = self.configure(signal, Some(pin)) {
                warn!("default {} not assigned: {}", signal, err);
            }
        }
    }

    /// Assign `signal` to `pin`, or unassign it with `None`.
    ///
    /// On error nothing has been touched.
    pub fn configure(&mut self, signal: SignalId, pin: Option<JtagPin>) -> Result<()> {
        let pin = match pin {
            Some(pin) => pin,
            None => {
                self.release(signal);
                return Ok(());
            }
        };

        let pin_count = self.port.pin_count();
        if pin >= pin_count {
            return Err(Error::InvalidPin { pin, pin_count });
        }
        if let Some(owner) = self.owner(pin) {
            if owner != signal {
                return Err(Error::PinUnavailable { pin, owner });
            }
        }

        if self.pin(signal) != Some(pin) {
            self.release(signal);
        }

        debug!("{} -> pin {}", signal, pin);
        self.usage.insert(pin);
        self.assignment[signal as usize] = Some(pin);
        if signal.is_output() {
            self.port.drive(pin, false);
        }
        self.port.set_direction(pin, signal.pin_config());
        Ok(())
    }

    /// Unassign every signal.
    pub fn release_all(&mut self) {
        for &signal in SignalId::ALL.iter() {
            self.release(signal);
        }
    }

    /// Drive an output signal. Unassigned signals and TDO are ignored.
    pub fn drive(&mut self, signal: SignalId, high: bool) {
        if !signal.is_output() {
            return;
        }
        if let Some(pin) = self.pin(signal) {
            trace!("{} = {}", signal, high as u8);
            self.port.drive(pin, high);
        }
    }

    /// Level on the signal's pin; `false` when unassigned.
    pub fn read(&mut self, signal: SignalId) -> bool {
        match self.pin(signal) {
            Some(pin) => self.port.read(pin),
            None => false,
        }
    }

    pub fn is_allocated(&self, signal: SignalId) -> bool {
        self.assignment[signal as usize].is_some()
    }

    pub fn pin(&self, signal: SignalId) -> Option<JtagPin> {
        self.assignment[signal as usize]
    }

    pub fn allocated(&self) -> JtagBit {
        SignalId::ALL
            .iter()
            .filter(|signal| self.is_allocated(**signal))
            .fold(JtagBit::empty(), |set, signal| set | signal.bit())
    }

    pub fn usage(&self) -> PinUsage {
        self.usage
    }

    /// One TCK period: high for `half_period_ns`, then low for as long.
    pub fn clock<D: DelayNs>(&mut self, delay: &mut D, half_period_ns: u32) {
        self.drive(SignalId::Tck, true);
        delay.delay_ns(half_period_ns);
        self.drive(SignalId::Tck, false);
        delay.delay_ns(half_period_ns);
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn owner(&self, pin: JtagPin) -> Option<SignalId> {
        if !self.usage.contains(pin) {
            return None;
        }
        SignalId::ALL
            .iter()
            .copied()
            .find(|signal| self.assignment[*signal as usize] == Some(pin))
    }

    /// Drive low and float the signal's pin, then forget it.
    fn release(&mut self, signal: SignalId) {
        if let Some(pin) = self.assignment[signal as usize].take() {
            debug!("{} released pin {}", signal, pin);
            self.port.drive(pin, false);
            self.port.set_direction(pin, PinConfig::INPUT);
            self.usage.remove(pin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::mock::{PortEvent, RecordingPort};
    use crate::interface::stm32::{MemoryRegisters, Register, Stm32Gpio};
    use crate::interface::PinMode;

    type Mux = SignalMux<Stm32Gpio<MemoryRegisters>>;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn mux() -> Mux {
        init_logger();
        SignalMux::new(Stm32Gpio::new(MemoryRegisters::new()))
    }

    fn reg(mux: &Mux, reg: Register) -> u32 {
        mux.port().registers().raw(reg)
    }

    fn mode(mux: &Mux, pin: JtagPin) -> u32 {
        (reg(mux, Register::Moder) >> (pin * 2)) & 0b11
    }

    fn assert_defaults(mux: &Mux) {
        assert_eq!(mux.pin(SignalId::Tck), Some(0));
        assert_eq!(mux.pin(SignalId::Tms), Some(1));
        assert_eq!(mux.pin(SignalId::Tdi), Some(2));
        assert_eq!(mux.pin(SignalId::Tdo), Some(3));
        assert_eq!(mux.pin(SignalId::Trst), None);
        assert_eq!(mux.usage().bits(), 0b1111);
        assert_eq!(
            mux.allocated(),
            JtagBit::TCK | JtagBit::TMS | JtagBit::TDI | JtagBit::TDO
        );
    }

    #[test]
    fn init_assigns_defaults() {
        let mux = mux();
        assert_defaults(&mux);
        assert_eq!(reg(&mux, Register::Moder), 0b00_01_01_01);
        assert_eq!(reg(&mux, Register::Otyper), 0);
        assert_eq!(reg(&mux, Register::Ospeedr), 0);
        assert_eq!(reg(&mux, Register::Pupdr), 0);
        assert_eq!(reg(&mux, Register::Odr), 0);
        assert_ne!(reg(&mux, Register::AhbEnr) & (1 << 20), 0);
    }

    #[test]
    fn init_is_idempotent() {
        let mut mux = mux();
        mux.configure(SignalId::Trst, Some(9)).unwrap();
        mux.configure(SignalId::Tck, Some(12)).unwrap();

        mux.init();
        assert_defaults(&mux);
        assert_eq!(reg(&mux, Register::Moder), 0b00_01_01_01);

        let first = reg(&mux, Register::Moder);
        mux.init();
        mux.init();
        assert_defaults(&mux);
        assert_eq!(reg(&mux, Register::Moder), first);
    }

    #[test]
    fn init_preserves_foreign_bits() {
        init_logger();
        let mut values = [0xA5A5_A5A5; Register::COUNT];
        values[Register::AhbEnr as usize] = 0x0000_0014;
        let mux = SignalMux::new(Stm32Gpio::new(MemoryRegisters::with_values(values)));

        assert_defaults(&mux);
        // pins 0-3 are the low byte of the two-bit registers, the low nibble of OTYPER
        assert_eq!(reg(&mux, Register::Moder), 0xA5A5_A500 | 0b00_01_01_01);
        assert_eq!(reg(&mux, Register::Ospeedr), 0xA5A5_A500);
        assert_eq!(reg(&mux, Register::Pupdr), 0xA5A5_A500);
        assert_eq!(reg(&mux, Register::Otyper), 0xA5A5_A5A0);
        assert_eq!(reg(&mux, Register::AhbEnr), 0x0010_0014);
    }

    #[test]
    fn configure_free_pin() {
        let mut mux = mux();
        mux.configure(SignalId::Trst, Some(7)).unwrap();

        assert!(mux.is_allocated(SignalId::Trst));
        assert_eq!(mux.pin(SignalId::Trst), Some(7));
        assert!(mux.usage().contains(7));
        assert_eq!(mode(&mux, 7), PinMode::Output as u32);
        assert_eq!(reg(&mux, Register::Bsrr), 1 << (16 + 7));
    }

    #[test]
    fn configure_tdo_is_input() {
        let mut mux = mux();
        mux.configure(SignalId::Tdo, Some(10)).unwrap();

        assert_eq!(mode(&mux, 10), PinMode::Input as u32);
        assert_eq!(mode(&mux, 3), PinMode::Input as u32);
        assert!(!mux.usage().contains(3));
        assert!(mux.usage().contains(10));
    }

    #[test]
    fn configure_invalid_pin_changes_nothing() {
        let mut mux = mux();
        let before = mux.port().registers().clone();

        assert_eq!(
            mux.configure(SignalId::Tck, Some(16)),
            Err(Error::InvalidPin {
                pin: 16,
                pin_count: 16
            })
        );
        assert_eq!(mux.port().registers(), &before);
        assert_defaults(&mux);
    }

    #[test]
    fn configure_taken_pin_changes_nothing() {
        let mut mux = mux();
        mux.configure(SignalId::Trst, Some(5)).unwrap();
        let before = mux.port().registers().clone();
        let usage = mux.usage();

        assert_eq!(
            mux.configure(SignalId::Tms, Some(2)),
            Err(Error::PinUnavailable {
                pin: 2,
                owner: SignalId::Tdi
            })
        );
        assert_eq!(
            mux.configure(SignalId::Trst, Some(0)),
            Err(Error::PinUnavailable {
                pin: 0,
                owner: SignalId::Tck
            })
        );
        assert_eq!(mux.port().registers(), &before);
        assert_eq!(mux.usage(), usage);
        assert_eq!(mux.pin(SignalId::Tms), Some(1));
        assert_eq!(mux.pin(SignalId::Trst), Some(5));
    }

    #[test]
    fn configure_same_pin_again() {
        let mut mux = mux();
        mux.configure(SignalId::Tms, Some(1)).unwrap();
        assert_defaults(&mux);
        assert_eq!(mode(&mux, 1), PinMode::Output as u32);
    }

    #[test]
    fn unassign_releases_pin() {
        let mut mux = mux();
        mux.drive(SignalId::Tdi, true);
        mux.configure(SignalId::Tdi, None).unwrap();

        assert!(!mux.is_allocated(SignalId::Tdi));
        assert!(!mux.usage().contains(2));
        assert_eq!(mode(&mux, 2), PinMode::Input as u32);
        assert_eq!(reg(&mux, Register::Odr) & (1 << 2), 0);

        // already unassigned
        mux.configure(SignalId::Tdi, None).unwrap();
        mux.configure(SignalId::Trst, None).unwrap();
        assert_eq!(mux.usage().bits(), 0b1011);
    }

    #[test]
    fn reassign_moves_signal() {
        let mut mux = mux();
        mux.configure(SignalId::Tck, Some(8)).unwrap();

        assert_eq!(mux.pin(SignalId::Tck), Some(8));
        assert_eq!(mux.usage().bits(), 0b1_0000_1110);
        assert_eq!(mode(&mux, 0), PinMode::Input as u32);
        assert_eq!(mode(&mux, 8), PinMode::Output as u32);

        // the old pin is free for someone else
        mux.configure(SignalId::Trst, Some(0)).unwrap();
        assert_eq!(mux.pin(SignalId::Trst), Some(0));
    }

    #[test]
    fn release_order_on_reassign() {
        init_logger();
        let mut mux = SignalMux::new(RecordingPort::new(16));
        mux.port_mut().events.clear();

        mux.configure(SignalId::Tms, Some(6)).unwrap();
        assert_eq!(
            mux.port().events,
            vec![
                PortEvent::Drive(1, false),
                PortEvent::Direction(1, PinMode::Input),
                PortEvent::Drive(6, false),
                PortEvent::Direction(6, PinMode::Output),
            ]
        );
    }

    #[test]
    fn drive_sets_single_bsrr_bit() {
        let mut mux = mux();
        mux.configure(SignalId::Trst, Some(11)).unwrap();

        mux.drive(SignalId::Trst, true);
        assert_eq!(reg(&mux, Register::Bsrr), 1 << 11);
        assert!(mux.read(SignalId::Trst));

        mux.drive(SignalId::Trst, false);
        assert_eq!(reg(&mux, Register::Bsrr), 1 << (16 + 11));
        assert!(!mux.read(SignalId::Trst));
    }

    #[test]
    fn drive_ignores_unassigned_and_tdo() {
        let mut mux = mux();
        let before = mux.port().registers().clone();

        for _ in 0..3 {
            mux.drive(SignalId::Trst, true);
            mux.drive(SignalId::Tdo, true);
            mux.drive(SignalId::Tdo, false);
        }
        assert_eq!(mux.port().registers(), &before);
    }

    #[test]
    fn read_tdo() {
        let mut mux = mux();
        mux.port_mut().registers_mut().set_inputs(1 << 3);
        assert!(mux.read(SignalId::Tdo));
        assert!(!mux.read(SignalId::Trst));

        mux.port_mut().registers_mut().set_inputs(0);
        assert!(!mux.read(SignalId::Tdo));
    }

    #[test]
    fn release_all_frees_every_pin() {
        let mut mux = mux();
        mux.configure(SignalId::Trst, Some(4)).unwrap();
        mux.release_all();

        assert_eq!(mux.usage().bits(), 0);
        assert_eq!(mux.allocated(), JtagBit::empty());
        assert_eq!(reg(&mux, Register::Moder), 0);
    }

    #[test]
    fn small_port_skips_defaults() {
        init_logger();
        let mux = SignalMux::new(RecordingPort::new(2));
        assert_eq!(mux.pin(SignalId::Tck), Some(0));
        assert_eq!(mux.pin(SignalId::Tms), Some(1));
        assert!(!mux.is_allocated(SignalId::Tdi));
        assert!(!mux.is_allocated(SignalId::Tdo));
        assert_eq!(mux.usage().bits(), 0b11);
    }

    #[test]
    fn signal_names() {
        let names: Vec<_> = SignalId::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["TCK", "TMS", "TDI", "TDO", "TRST"]);
        assert!(!SignalId::Tdo.is_output());
        assert!(SignalId::Trst.is_output());
    }
}
