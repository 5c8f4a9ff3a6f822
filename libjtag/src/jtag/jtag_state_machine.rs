use core::fmt;

use rust_fsm::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TapState {
    /// Nothing is known about the TAP, e.g. after an external reset.
    Unknown,
    Reset,
    Idle,
    DrScan,
    DrCapture,
    DrShift,
    DrExit1,
    DrPause,
    DrExit2,
    DrUpdate,
    IrScan,
    IrCapture,
    IrShift,
    IrExit1,
    IrPause,
    IrExit2,
    IrUpdate,
}

impl TapState {
    pub const ALL: [TapState; 17] = [
        TapState::Unknown,
        TapState::Reset,
        TapState::Idle,
        TapState::DrScan,
        TapState::DrCapture,
        TapState::DrShift,
        TapState::DrExit1,
        TapState::DrPause,
        TapState::DrExit2,
        TapState::DrUpdate,
        TapState::IrScan,
        TapState::IrCapture,
        TapState::IrShift,
        TapState::IrExit1,
        TapState::IrPause,
        TapState::IrExit2,
        TapState::IrUpdate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TapState::Unknown => "Unknown",
            TapState::Reset => "Reset",
            TapState::Idle => "Run/Idle",
            TapState::DrScan => "Scan DR",
            TapState::DrCapture => "Capture DR",
            TapState::DrShift => "Shift DR",
            TapState::DrExit1 => "Exit 1 DR",
            TapState::DrPause => "Pause DR",
            TapState::DrExit2 => "Exit 2 DR",
            TapState::DrUpdate => "Update DR",
            TapState::IrScan => "Scan IR",
            TapState::IrCapture => "Capture IR",
            TapState::IrShift => "Shift IR",
            TapState::IrExit1 => "Exit 1 IR",
            TapState::IrPause => "Pause IR",
            TapState::IrExit2 => "Exit 2 IR",
            TapState::IrUpdate => "Update IR",
        }
    }
}

impl fmt::Display for TapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The IEEE 1149.1 TAP graph, clocked by the TMS level.
///
/// `Unknown` has no outgoing edges: only a reset gets out of it.
#[derive(Debug)]
pub struct TapStateMachine;

impl StateMachineImpl for TapStateMachine {
    type Input = bool;
    type State = TapState;
    type Output = ();

    const INITIAL_STATE: Self::State = TapState::Unknown;

    fn transition(state: &Self::State, input: &Self::Input) -> Option<Self::State> {
        match (state, input) {
            (TapState::Unknown, _) => None,

            (TapState::Reset, &true) => Some(TapState::Reset),
            (TapState::Reset, &false) => Some(TapState::Idle),

            (TapState::Idle, &true) => Some(TapState::DrScan),
            (TapState::Idle, &false) => Some(TapState::Idle),

            // DR
            (TapState::DrScan, &true) => Some(TapState::IrScan),
            (TapState::DrScan, &false) => Some(TapState::DrCapture),
            (TapState::DrCapture, &true) => Some(TapState::DrExit1),
            (TapState::DrCapture, &false) => Some(TapState::DrShift),
            (TapState::DrShift, &true) => Some(TapState::DrExit1),
            (TapState::DrShift, &false) => Some(TapState::DrShift),
            (TapState::DrExit1, &true) => Some(TapState::DrUpdate),
            (TapState::DrExit1, &false) => Some(TapState::DrPause),
            (TapState::DrPause, &true) => Some(TapState::DrExit2),
            (TapState::DrPause, &false) => Some(TapState::DrPause),
            (TapState::DrExit2, &true) => Some(TapState::DrUpdate),
            (TapState::DrExit2, &false) => Some(TapState::DrShift),
            (TapState::DrUpdate, &true) => Some(TapState::DrScan),
            (TapState::DrUpdate, &false) => Some(TapState::Idle),

            // IR
            (TapState::IrScan, &true) => Some(TapState::Reset),
            (TapState::IrScan, &false) => Some(TapState::IrCapture),
            (TapState::IrCapture, &true) => Some(TapState::IrExit1),
            (TapState::IrCapture, &false) => Some(TapState::IrShift),
            (TapState::IrShift, &true) => Some(TapState::IrExit1),
            (TapState::IrShift, &false) => Some(TapState::IrShift),
            (TapState::IrExit1, &true) => Some(TapState::IrUpdate),
            (TapState::IrExit1, &false) => Some(TapState::IrPause),
            (TapState::IrPause, &true) => Some(TapState::IrExit2),
            (TapState::IrPause, &false) => Some(TapState::IrPause),
            (TapState::IrExit2, &true) => Some(TapState::IrUpdate),
            (TapState::IrExit2, &false) => Some(TapState::IrShift),
            (TapState::IrUpdate, &true) => Some(TapState::DrScan),
            (TapState::IrUpdate, &false) => Some(TapState::Idle),
        }
    }

    fn output(_state: &Self::State, _input: &Self::Input) -> Option<Self::Output> {
        None
    }
}
