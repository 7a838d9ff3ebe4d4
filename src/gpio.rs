//! GPIO output collaborator
//!
//! The actuation core only needs "drive pin N to a level"; everything else
//! about the output hardware stays behind this seam.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

/// Output pin assignments, matching the reference hardware
pub mod pins {
    pub const RELAY_1: u8 = 16;
    pub const RELAY_2: u8 = 17;
    pub const STATUS_LED: u8 = 23;
}

/// Something that can drive a GPIO output level
pub trait GpioSet: Send + Sync {
    /// Assert the requested level on the pin
    fn set_level(&self, pin: u8, high: bool);
}

/// In-process GPIO backend
///
/// Records the last driven level per pin; stands in for a memory-mapped pin
/// controller on hardware builds and lets tests observe output levels.
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    levels: Mutex<HashMap<u8, bool>>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last driven level for a pin, if it was ever driven
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.lock().unwrap().get(&pin).copied()
    }
}

impl GpioSet for SimulatedGpio {
    fn set_level(&self, pin: u8, high: bool) {
        debug!(pin, high, "gpio level set");
        self.levels.lock().unwrap().insert(pin, high);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_recorded() {
        let gpio = SimulatedGpio::new();
        assert_eq!(gpio.level(pins::RELAY_1), None);

        gpio.set_level(pins::RELAY_1, true);
        gpio.set_level(pins::RELAY_2, false);
        assert_eq!(gpio.level(pins::RELAY_1), Some(true));
        assert_eq!(gpio.level(pins::RELAY_2), Some(false));

        gpio.set_level(pins::RELAY_1, false);
        assert_eq!(gpio.level(pins::RELAY_1), Some(false));
    }
}
