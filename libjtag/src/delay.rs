//! Delay providers for the TCK half period and the TRST pulse.
//!
//! The engine only needs `embedded_hal::delay::DelayNs`, so boards with a
//! real timer can pass their HAL delay instead.

use embedded_hal::delay::DelayNs;

/// Busy-wait calibrated in spin iterations per microsecond.
///
/// The default of 20 loops/us makes a 1 ms TRST pulse equal to 20000
/// iterations, which suits a ~72 MHz Cortex-M. Retune when the core clock
/// changes.
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    pub const fn new(loops_per_us: u32) -> Self {
        SpinDelay { loops_per_us }
    }
}

impl Default for SpinDelay {
    fn default() -> Self {
        SpinDelay::new(20)
    }
}

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let loops = (ns as u64 * self.loops_per_us as u64) / 1000;
        for _ in 0..loops {
            core::hint::spin_loop();
        }
    }
}

/// Sleeps the calling thread, for hosted adapters.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}
