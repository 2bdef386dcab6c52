//! # Pin provider
//!
//! Drivers in this crate are generic over `embedded-hal` pin types. A
//! [`PinProvider`] hands out those pins by BCM GPIO number, which lets the
//! same driver run on the Pi (via `rppal`) or against test doubles.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;
use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
    PwmPin,
};

use crate::PeriphError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Source of GPIO pins for the peripheral drivers.
pub trait PinProvider {
    /// Error type shared by the digital pins of this provider.
    type PinError: Debug;

    /// Push-pull output pin.
    type Output: OutputPin<Error = Self::PinError>;

    /// Input pin with the internal pull-up enabled.
    type Input: InputPin<Error = Self::PinError>;

    /// PWM output with a duty cycle in `[0, 1]`.
    type Pwm: PwmPin<Duty = f64>;

    /// Blocking microsecond delay.
    type Delay: DelayUs<u32>;

    /// Open `pin` as an output.
    fn output(&mut self, pin: u8) -> Result<Self::Output, PeriphError>;

    /// Open `pin` as an input with pull-up.
    fn input_pullup(&mut self, pin: u8) -> Result<Self::Input, PeriphError>;

    /// Open `pin` as a PWM output at the given frequency.
    fn pwm(&mut self, pin: u8, frequency_hz: f64) -> Result<Self::Pwm, PeriphError>;

    /// Get a delay provider.
    fn delay(&mut self) -> Self::Delay;
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a pin level error into a [`PeriphError`].
pub(crate) fn gpio_err<E: Debug>(e: E) -> PeriphError {
    PeriphError::Gpio(format!("{:?}", e))
}
