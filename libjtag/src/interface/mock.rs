use crate::interface::{GpioPort, PinConfig, PinMode};
use crate::jtag::JtagPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortEvent {
    EnableClock,
    Direction(JtagPin, PinMode),
    Drive(JtagPin, bool),
}

/// Port that remembers everything done to it.
pub struct RecordingPort {
    pub pin_count: u8,
    pub inputs: u32,
    pub events: Vec<PortEvent>,
}

impl RecordingPort {
    pub fn new(pin_count: u8) -> Self {
        RecordingPort {
            pin_count,
            inputs: 0,
            events: Vec::new(),
        }
    }

    /// TMS level seen at every rising edge of TCK.
    pub fn tms_at_rising_edges(&self, tck: JtagPin, tms: JtagPin) -> Vec<bool> {
        let mut level = false;
        let mut sampled = Vec::new();
        for event in &self.events {
            match *event {
                PortEvent::Drive(pin, high) if pin == tms => level = high,
                PortEvent::Drive(pin, true) if pin == tck => sampled.push(level),
                _ => (),
            }
        }
        sampled
    }

    pub fn drives_of(&self, pin: JtagPin) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                PortEvent::Drive(p, high) if p == pin => Some(high),
                _ => None,
            })
            .collect()
    }
}

impl GpioPort for RecordingPort {
    fn pin_count(&self) -> u8 {
        self.pin_count
    }
    fn enable_clock(&mut self) {
        self.events.push(PortEvent::EnableClock);
    }
    fn set_direction(&mut self, pin: JtagPin, config: PinConfig) {
        self.events.push(PortEvent::Direction(pin, config.mode));
    }
    fn drive(&mut self, pin: JtagPin, high: bool) {
        self.events.push(PortEvent::Drive(pin, high));
    }
    fn read(&mut self, pin: JtagPin) -> bool {
        self.inputs & (1 << pin) != 0
    }
}
