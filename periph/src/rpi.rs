//! # Raspberry Pi GPIO backend
//!
//! [`PinProvider`] implementation backed by `rppal`. The AlphaBot2's motor
//! speed pins (GPIO 6 and 26) are not hardware PWM capable so speed is set
//! with `rppal`'s software PWM.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::Infallible;

use embedded_hal::PwmPin;
use log::warn;
use rppal::{gpio, hal::Delay};

use crate::{
    dc_motor::DcMotorPair,
    pins::PinProvider,
    tlc1543::LineSensorArray,
    PeriphError, PeriphParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pins from the Pi's GPIO header.
pub struct RpiPins {
    gpio: gpio::Gpio,
}

/// Software PWM on a GPIO output.
pub struct SoftPwm {
    pin: gpio::OutputPin,
    frequency_hz: f64,
    duty: f64,
    enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the AlphaBot2 line sensor array on the Pi's GPIO.
///
/// The array is returned unacquired.
pub fn line_sensor_array(params: &PeriphParams) -> Result<LineSensorArray<RpiPins>, PeriphError> {
    LineSensorArray::new(RpiPins::new()?, params.adc, &params.line_channels)
}

/// Build the AlphaBot2 motor pair on the Pi's GPIO.
///
/// The pair is returned unacquired.
pub fn motor_pair(params: &PeriphParams) -> Result<DcMotorPair<RpiPins>, PeriphError> {
    Ok(DcMotorPair::new(
        RpiPins::new()?,
        params.motor_left,
        params.motor_right,
        params.pwm_frequency_hz,
    ))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RpiPins {
    /// Open the GPIO peripheral.
    pub fn new() -> Result<Self, PeriphError> {
        gpio::Gpio::new()
            .map(|gpio| Self { gpio })
            .map_err(|e| PeriphError::InitFailed(format!("Cannot open GPIO: {}", e)))
    }

    fn get(&self, pin: u8) -> Result<gpio::Pin, PeriphError> {
        self.gpio.get(pin).map_err(|e| PeriphError::PinUnavailable {
            pin,
            msg: e.to_string(),
        })
    }
}

impl PinProvider for RpiPins {
    type PinError = Infallible;
    type Output = gpio::OutputPin;
    type Input = gpio::InputPin;
    type Pwm = SoftPwm;
    type Delay = Delay;

    fn output(&mut self, pin: u8) -> Result<Self::Output, PeriphError> {
        self.get(pin).map(|p| p.into_output())
    }

    fn input_pullup(&mut self, pin: u8) -> Result<Self::Input, PeriphError> {
        self.get(pin).map(|p| p.into_input_pullup())
    }

    fn pwm(&mut self, pin: u8, frequency_hz: f64) -> Result<Self::Pwm, PeriphError> {
        Ok(SoftPwm {
            pin: self.output(pin)?,
            frequency_hz,
            duty: 0.0,
            enabled: false,
        })
    }

    fn delay(&mut self) -> Self::Delay {
        Delay::new()
    }
}

impl SoftPwm {
    fn apply(&mut self) {
        let res = if self.enabled {
            self.pin.set_pwm_frequency(self.frequency_hz, self.duty)
        }
        else {
            self.pin.clear_pwm()
        };

        if let Err(e) = res {
            warn!("Software PWM on GPIO {} failed: {}", self.pin.pin(), e);
        }
    }
}

impl PwmPin for SoftPwm {
    type Duty = f64;

    fn disable(&mut self) {
        self.enabled = false;
        self.apply();
        self.pin.set_low();
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.apply();
    }

    fn get_duty(&self) -> f64 {
        self.duty
    }

    fn get_max_duty(&self) -> f64 {
        1.0
    }

    fn set_duty(&mut self, duty: f64) {
        self.duty = duty.max(0.0).min(1.0);
        if self.enabled {
            self.apply();
        }
    }
}
