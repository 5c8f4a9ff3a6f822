use embedded_hal::delay::DelayNs;
use log::warn;
use spin::mutex::Mutex;

use crate::error::Result;
use crate::interface::GpioPort;
use crate::jtag::jtag_state_machine::TapState;
use crate::jtag::signal::{SignalId, SignalMux};
use crate::jtag::tap::{TapConfig, TapEngine};
use crate::jtag::JtagPin;

/// A controller shared between callers; lock it for every operation.
pub type SharedJtag<P, D> = Mutex<JtagController<P, D>>;

/// Pin assignment, TAP state and delay source of one JTAG adapter.
pub struct JtagController<P, D> {
    pub signals: SignalMux<P>,
    tap: TapEngine,
    delay: D,
}

impl<P: GpioPort, D: DelayNs> JtagController<P, D> {
    /// Takes over `port` with the default signal assignment and an unknown TAP.
    pub fn new(port: P, delay: D, config: TapConfig) -> Self {
        JtagController {
            signals: SignalMux::new(port),
            tap: TapEngine::new(config),
            delay,
        }
    }

    pub fn init(&mut self) {
        self.signals.init();
        self.tap.init();
    }

    pub fn configure(&mut self, signal: SignalId, pin: Option<JtagPin>) -> Result<()> {
        self.signals.configure(signal, pin).map_err(|err| {
            warn!("cannot assign {}: {}", signal, err);
            err
        })
    }

    pub fn drive(&mut self, signal: SignalId, high: bool) {
        self.signals.drive(signal, high);
    }

    pub fn read(&mut self, signal: SignalId) -> bool {
        self.signals.read(signal)
    }

    pub fn is_allocated(&self, signal: SignalId) -> bool {
        self.signals.is_allocated(signal)
    }

    pub fn pin(&self, signal: SignalId) -> Option<JtagPin> {
        self.signals.pin(signal)
    }

    /// One TCK period at the configured rate.
    pub fn clock(&mut self) {
        let half_period = self.tap.config().tck_half_period_ns;
        self.signals.clock(&mut self.delay, half_period);
    }

    pub fn tap_state(&self) -> TapState {
        self.tap.state()
    }

    pub fn set_tap_state(&mut self, target: TapState) {
        self.tap.set_state(target, &mut self.signals, &mut self.delay);
    }

    pub fn into_parts(self) -> (P, D) {
        let JtagController { signals, delay, .. } = self;
        (signals.into_port(), delay)
    }
}
