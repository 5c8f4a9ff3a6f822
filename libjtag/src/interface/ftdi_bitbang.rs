use anyhow::{Context, Result};
use log::{debug, error};
use safe_ftdi;

use crate::interface::{GpioPort, PinConfig, PinMode};
use crate::jtag::JtagPin;

const CHUNK_SIZE: usize = 512;
const FTDI_PINS: u8 = 8;

/// The ADBUS pins of an FTDI chip in synchronous bit-bang mode.
///
/// Every byte written is answered by one byte of sampled pin levels, so each
/// write is paired with a read to keep the receive queue in step.
pub struct FtdiBitBang {
    device: safe_ftdi::Context,
    /// Bit set for outputs.
    direction: u8,
    output: u8,
}

impl FtdiBitBang {
    pub fn new(vid: u16, pid: u16, baudrate: u32) -> Result<Self> {
        let mut device = safe_ftdi::Context::new().context("failed to create ftdi context")?;
        device
            .open(vid, pid)
            .with_context(|| format!("failed to open {:#04x}:{:#04x}", vid, pid))?;
        device
            .set_baudrate(baudrate)
            .with_context(|| format!("failed to set baudrate {}", baudrate))?;

        let mut ftdi = FtdiBitBang {
            device,
            direction: 0,
            output: 0,
        };
        ftdi.apply_bitmode()?;

        // purge rx data
        let mut stale = [0; CHUNK_SIZE];
        ftdi.device
            .read_data(&mut stale)
            .context("failed to purge rx data")?;

        Ok(ftdi)
    }

    fn apply_bitmode(&mut self) -> Result<()> {
        self.device
            .set_bitmode(self.direction, safe_ftdi::mpsse::MpsseMode::BITMODE_SYNCBB)
            .with_context(|| format!("failed to set direction {:#010b}", self.direction))?;
        Ok(())
    }

    /// Put the output byte on the pins and return what was sampled.
    fn transfer(&mut self) -> Result<u8> {
        let mut sampled = [0u8; 1];
        self.device
            .write_data(&[self.output])
            .context("failed to write pins")?;
        self.device
            .read_data(&mut sampled)
            .context("failed to read pins")?;
        Ok(sampled[0])
    }
}

impl GpioPort for FtdiBitBang {
    fn pin_count(&self) -> u8 {
        FTDI_PINS
    }

    fn enable_clock(&mut self) {
        if let Err(err) = self.apply_bitmode() {
            error!("{:?}", err);
        }
    }

    fn set_direction(&mut self, pin: JtagPin, config: PinConfig) {
        // push-pull only, no pulls
        debug!("ftdi pin {} -> {:?}", pin, config.mode);
        match config.mode {
            PinMode::Output => self.direction |= 1 << pin,
            PinMode::Input => self.direction &= !(1 << pin),
        }
        if let Err(err) = self.apply_bitmode() {
            error!("{:?}", err);
        }
    }

    fn drive(&mut self, pin: JtagPin, high: bool) {
        if high {
            self.output |= 1 << pin;
        } else {
            self.output &= !(1 << pin);
        }
        if let Err(err) = self.transfer() {
            error!("{:?}", err);
        }
    }

    fn read(&mut self, pin: JtagPin) -> bool {
        match self.transfer() {
            Ok(levels) => levels & (1 << pin) != 0,
            Err(err) => {
                error!("{:?}", err);
                false
            }
        }
    }
}
