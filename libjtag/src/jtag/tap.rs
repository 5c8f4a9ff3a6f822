//! TAP state engine.
//!
//! The engine walks the TAP one TCK pulse at a time. For every state a
//! [`Rule`] decides the TMS level, given where the caller wants to end up,
//! and [`TapStateMachine`] supplies the state that level leads to.

use embedded_hal::delay::DelayNs;
use log::debug;
use rust_fsm::StateMachineImpl;

use crate::interface::GpioPort;
use crate::jtag::jtag_state_machine::{TapState, TapStateMachine};
use crate::jtag::signal::{SignalId, SignalMux};

pub const DEFAULT_TCK_HALF_PERIOD_NS: u32 = 50_000;
pub const DEFAULT_TRST_PULSE_NS: u32 = 1_000_000;

/// Number of TMS=1 clocks that reach Reset from any state.
const RESET_CLOCKS: usize = 5;

const DR_STATES: &[TapState] = &[
    TapState::DrCapture,
    TapState::DrShift,
    TapState::DrExit1,
    TapState::DrPause,
    TapState::DrExit2,
    TapState::DrUpdate,
];

const IR_STATES: &[TapState] = &[
    TapState::IrCapture,
    TapState::IrShift,
    TapState::IrExit1,
    TapState::IrPause,
    TapState::IrExit2,
    TapState::IrUpdate,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapConfig {
    pub tck_half_period_ns: u32,
    /// How long TRST is held asserted.
    pub trst_pulse_ns: u32,
}

impl Default for TapConfig {
    fn default() -> Self {
        TapConfig {
            tck_half_period_ns: DEFAULT_TCK_HALF_PERIOD_NS,
            trst_pulse_ns: DEFAULT_TRST_PULSE_NS,
        }
    }
}

/// How to leave a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Reset the TAP, by TRST when it is wired or else by clocking TMS high.
    ForceReset,
    /// TMS is always this level.
    Tms(bool),
    /// TMS low if the target is one of these states, high otherwise.
    LowToward(&'static [TapState]),
}

impl Rule {
    /// TMS level for heading to `target`. `None` for [`Rule::ForceReset`].
    pub fn tms(self, target: TapState) -> Option<bool> {
        match self {
            Rule::ForceReset => None,
            Rule::Tms(level) => Some(level),
            Rule::LowToward(states) => Some(!states.contains(&target)),
        }
    }
}

pub fn rule(state: TapState) -> Rule {
    match state {
        TapState::Unknown => Rule::ForceReset,
        TapState::Reset => Rule::Tms(false),
        TapState::Idle => Rule::Tms(true),

        TapState::DrScan => Rule::LowToward(DR_STATES),
        TapState::DrCapture => Rule::LowToward(&[TapState::DrShift]),
        TapState::DrShift => Rule::Tms(true),
        TapState::DrExit1 => {
            Rule::LowToward(&[TapState::DrPause, TapState::DrExit2, TapState::DrShift])
        }
        TapState::DrPause => Rule::Tms(true),
        TapState::DrExit2 => {
            Rule::LowToward(&[TapState::DrPause, TapState::DrExit1, TapState::DrShift])
        }
        TapState::DrUpdate => Rule::LowToward(&[TapState::Idle]),

        TapState::IrScan => Rule::LowToward(IR_STATES),
        TapState::IrCapture => Rule::LowToward(&[TapState::IrShift]),
        TapState::IrShift => Rule::Tms(true),
        TapState::IrExit1 => {
            Rule::LowToward(&[TapState::IrPause, TapState::IrExit2, TapState::IrShift])
        }
        TapState::IrPause => Rule::Tms(true),
        TapState::IrExit2 => {
            Rule::LowToward(&[TapState::IrPause, TapState::IrExit1, TapState::IrShift])
        }
        TapState::IrUpdate => Rule::LowToward(&[TapState::Idle]),
    }
}

pub struct TapEngine {
    state: TapState,
    config: TapConfig,
}

impl TapEngine {
    pub fn new(config: TapConfig) -> Self {
        TapEngine {
            state: TapState::Unknown,
            config,
        }
    }

    /// Forget the TAP state. No hardware is touched.
    pub fn init(&mut self) {
        self.state = TapState::Unknown;
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Clock the TAP into `target`.
    ///
    /// Targeting [`TapState::Unknown`] only marks the state as untrusted.
    pub fn set_state<P, D>(
        &mut self,
        target: TapState,
        signals: &mut SignalMux<P>,
        delay: &mut D,
    ) where
        P: GpioPort,
        D: DelayNs,
    {
        if target == TapState::Unknown {
            debug!("jtag state change: {:?} -> {:?}", self.state, target);
            self.state = TapState::Unknown;
            return;
        }

        if target == TapState::Reset && signals.is_allocated(SignalId::Trst) {
            self.pulse_trst(signals, delay);
            debug!("jtag state change: {:?} -> {:?} (TRST)", self.state, target);
            self.state = TapState::Reset;
        }

        while self.state != target {
            let from = self.state;
            match rule(from).tms(target) {
                Some(tms) => {
                    signals.drive(SignalId::Tms, tms);
                    signals.clock(delay, self.config.tck_half_period_ns);
                    // only Unknown lacks edges, and it is never stepped here
                    self.state =
                        TapStateMachine::transition(&from, &tms).unwrap_or(TapState::Unknown);
                }
                None => self.force_reset(signals, delay),
            }
            debug!("jtag state change: {:?} -> {:?}", from, self.state);
        }
    }

    fn force_reset<P, D>(&mut self, signals: &mut SignalMux<P>, delay: &mut D)
    where
        P: GpioPort,
        D: DelayNs,
    {
        if signals.is_allocated(SignalId::Trst) {
            self.pulse_trst(signals, delay);
        } else {
            signals.drive(SignalId::Tms, true);
            for _ in 0..RESET_CLOCKS {
                signals.clock(delay, self.config.tck_half_period_ns);
            }
        }
        self.state = TapState::Reset;
    }

    fn pulse_trst<P: GpioPort, D: DelayNs>(&self, signals: &mut SignalMux<P>, delay: &mut D) {
        signals.drive(SignalId::Tms, true);
        signals.drive(SignalId::Trst, false);
        delay.delay_ns(self.config.trst_pulse_ns);
        signals.drive(SignalId::Trst, true);
    }
}
