use anyhow::{Context, Result};
use log::{info, warn};
use spin::mutex::Mutex;

extern crate libjtag;

use libjtag::delay::StdDelay;
use libjtag::interface::GpioPort;
use libjtag::jtag::tap::TapConfig;
use libjtag::{JtagController, SharedJtag, SignalId, TapState};

#[cfg(feature = "ftdi")]
use libjtag::interface::ftdi_bitbang::FtdiBitBang;
#[cfg(not(feature = "ftdi"))]
use libjtag::interface::stm32::{MemoryRegisters, Stm32Gpio};

/// TRST wire on the default harness.
const TRST_PIN: u8 = 4;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .filter(|meta| !meta.target().contains("stm32") && !meta.target().contains("ftdi"))
        .apply()?;
    Ok(())
}

#[cfg(feature = "ftdi")]
fn open_port() -> Result<FtdiBitBang> {
    FtdiBitBang::new(0x15ba, 0x002a, 10000)
}

#[cfg(not(feature = "ftdi"))]
fn open_port() -> Result<Stm32Gpio<MemoryRegisters>> {
    Ok(Stm32Gpio::new(MemoryRegisters::new()))
}

fn walk<P: GpioPort>(jtag: &SharedJtag<P, StdDelay>, states: &[TapState]) {
    for &state in states {
        let mut jtag = jtag.lock();
        jtag.set_tap_state(state);
        info!("TAP in {}, TDO = {}", jtag.tap_state(), jtag.read(SignalId::Tdo) as u8);
    }
}

fn main() -> Result<()> {
    setup_logger().context("failed to set up logging")?;

    let port = open_port()?;
    let jtag = Mutex::new(JtagController::new(port, StdDelay, TapConfig::default()));

    {
        let mut jtag = jtag.lock();
        for signal in SignalId::ALL.iter() {
            match jtag.pin(*signal) {
                Some(pin) => info!("{} on pin {}", signal, pin),
                None => info!("{} not connected", signal),
            }
        }
        if let Err(err) = jtag.configure(SignalId::Trst, Some(TRST_PIN)) {
            warn!("running without TRST: {}", err);
        }
    }

    walk(
        &jtag,
        &[
            TapState::Reset,
            TapState::Idle,
            TapState::DrShift,
            TapState::IrShift,
            TapState::Idle,
        ],
    );

    // hand the TAP back in a known state
    jtag.lock().set_tap_state(TapState::Reset);
    Ok(())
}
