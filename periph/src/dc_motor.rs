//! # DC Motor Driver
//!
//! Drives a brushed DC motor through one channel of an H-bridge (the
//! AlphaBot2 uses a TB6612FNG) in three pin mode: a PWM pin sets the speed and
//! two direction pins set the polarity.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;

use embedded_hal::{digital::v2::OutputPin, PwmPin};
use log::{debug, trace, warn};

use crate::{
    params::MotorPins,
    pins::{gpio_err, PinProvider},
    MotorActuator, PeriphError, Peripheral,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single DC motor.
pub struct DcMotor<P, O> {
    pwm: P,
    in1: O,
    in2: O,
    speed: f64,
}

/// The left and right drive motors.
pub struct DcMotorPair<G: PinProvider> {
    provider: G,
    left_pins: MotorPins,
    right_pins: MotorPins,
    pwm_frequency_hz: f64,
    motors: Option<(DcMotor<G::Pwm, G::Output>, DcMotor<G::Pwm, G::Output>)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P, O, E> DcMotor<P, O>
where
    P: PwmPin<Duty = f64>,
    O: OutputPin<Error = E>,
    E: Debug,
{
    /// Create a new motor from opened pins. The motor starts stopped.
    pub fn new(pwm: P, in1: O, in2: O) -> Result<Self, PeriphError> {
        let mut motor = Self {
            pwm,
            in1,
            in2,
            speed: 0.0,
        };

        motor.pwm.set_duty(0.0);
        motor.pwm.enable();
        motor.set_speed(0.0)?;

        Ok(motor)
    }

    /// Set the speed of the motor.
    ///
    /// ## Arguments
    /// - `speed` - The speed to set, between -1.0 (full reverse) and 1.0 (full
    ///   forward). Values outside this range are rejected.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), PeriphError> {
        if !(-1.0..=1.0).contains(&speed) {
            return Err(PeriphError::InvalidSpeed(speed))
        }

        if speed > 0.0 {
            self.in1.set_high().map_err(gpio_err)?;
            self.in2.set_low().map_err(gpio_err)?;
        }
        else if speed < 0.0 {
            self.in1.set_low().map_err(gpio_err)?;
            self.in2.set_high().map_err(gpio_err)?;
        }
        else {
            // Coast
            self.in1.set_low().map_err(gpio_err)?;
            self.in2.set_low().map_err(gpio_err)?;
        }

        let max_duty = self.pwm.get_max_duty();
        self.pwm.set_duty(speed.abs() * max_duty);
        self.speed = speed;

        Ok(())
    }

    /// The last speed successfully set.
    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl<G: PinProvider> DcMotorPair<G> {
    /// Create a new, unacquired, motor pair.
    pub fn new(
        provider: G,
        left_pins: MotorPins,
        right_pins: MotorPins,
        pwm_frequency_hz: f64
    ) -> Self {
        Self {
            provider,
            left_pins,
            right_pins,
            pwm_frequency_hz,
            motors: None,
        }
    }

    /// The current (left, right) speeds, or `None` if not acquired.
    pub fn speeds(&self) -> Option<(f64, f64)> {
        self.motors.as_ref().map(|(l, r)| (l.speed(), r.speed()))
    }

    fn open(&mut self, pins: MotorPins) -> Result<DcMotor<G::Pwm, G::Output>, PeriphError> {
        let pwm = self.provider.pwm(pins.pwm, self.pwm_frequency_hz)?;
        let in1 = self.provider.output(pins.in1)?;
        let in2 = self.provider.output(pins.in2)?;

        DcMotor::new(pwm, in1, in2)
    }
}

impl<G: PinProvider> Peripheral for DcMotorPair<G> {
    fn acquire(&mut self) -> Result<(), PeriphError> {
        if self.motors.is_some() {
            self.release();
        }

        let left = self.open(self.left_pins)?;
        let right = self.open(self.right_pins)?;

        self.motors = Some((left, right));

        debug!(
            "Motors acquired (left: {:?}, right: {:?})",
            self.left_pins, self.right_pins
        );

        Ok(())
    }

    fn release(&mut self) {
        if let Some((mut left, mut right)) = self.motors.take() {
            // Make sure nothing is left running once the pins are dropped
            for motor in [&mut left, &mut right].iter_mut() {
                if let Err(e) = motor.set_speed(0.0) {
                    warn!("Could not stop motor during release: {}", e);
                }
                motor.pwm.disable();
            }

            debug!("Motors released");
        }
    }

    fn is_acquired(&self) -> bool {
        self.motors.is_some()
    }
}

impl<G: PinProvider> MotorActuator for DcMotorPair<G> {
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), PeriphError> {
        let (motor_l, motor_r) = self.motors.as_mut().ok_or(PeriphError::NotAcquired)?;

        motor_l.set_speed(left)?;
        motor_r.set_speed(right)?;

        trace!("Motor speeds: [{:.3}, {:.3}]", left, right);

        Ok(())
    }

    fn stop(&mut self) -> Result<(), PeriphError> {
        match self.motors {
            Some(_) => self.set_speeds(0.0, 0.0),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{MockBus, MockPins};

    const LEFT: MotorPins = MotorPins { pwm: 6, in1: 12, in2: 13 };
    const RIGHT: MotorPins = MotorPins { pwm: 26, in1: 20, in2: 21 };

    fn pair(bus: &MockBus) -> DcMotorPair<MockPins> {
        DcMotorPair::new(MockPins::new(bus), LEFT, RIGHT, 50.0)
    }

    #[test]
    fn test_direction_and_duty() {
        let bus = MockBus::new();
        let mut motors = pair(&bus);
        motors.acquire().unwrap();

        motors.set_speeds(0.5, -0.25).unwrap();
        assert_eq!(bus.level(LEFT.in1), Some(true));
        assert_eq!(bus.level(LEFT.in2), Some(false));
        assert_eq!(bus.duty(LEFT.pwm), Some(0.5));
        assert_eq!(bus.level(RIGHT.in1), Some(false));
        assert_eq!(bus.level(RIGHT.in2), Some(true));
        assert_eq!(bus.duty(RIGHT.pwm), Some(0.25));
        assert_eq!(motors.speeds(), Some((0.5, -0.25)));

        motors.stop().unwrap();
        assert_eq!(bus.level(LEFT.in1), Some(false));
        assert_eq!(bus.level(LEFT.in2), Some(false));
        assert_eq!(bus.duty(LEFT.pwm), Some(0.0));
        assert_eq!(bus.duty(RIGHT.pwm), Some(0.0));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let bus = MockBus::new();
        let mut motors = pair(&bus);
        motors.acquire().unwrap();
        motors.set_speeds(0.3, 0.3).unwrap();

        assert!(matches!(
            motors.set_speeds(1.5, 0.0),
            Err(PeriphError::InvalidSpeed(_))
        ));

        // Rejected demands leave the motor untouched
        assert_eq!(motors.speeds(), Some((0.3, 0.3)));

        assert!(matches!(
            motors.set_speeds(0.0, f64::NAN),
            Err(PeriphError::InvalidSpeed(_))
        ));
        assert_eq!(motors.speeds().map(|s| s.1), Some(0.3));
    }

    #[test]
    fn test_lifecycle() {
        let bus = MockBus::new();
        let mut motors = pair(&bus);

        assert!(matches!(motors.set_speeds(0.1, 0.1), Err(PeriphError::NotAcquired)));
        assert!(motors.stop().is_ok());

        motors.acquire().unwrap();
        motors.set_speeds(0.8, 0.8).unwrap();

        // Reacquire stops the motors before reopening the pins
        motors.acquire().unwrap();
        assert_eq!(motors.speeds(), Some((0.0, 0.0)));

        motors.set_speeds(0.8, 0.8).unwrap();
        motors.release();
        assert!(!motors.is_acquired());
        assert_eq!(bus.duty(LEFT.pwm), Some(0.0));
    }

    #[test]
    fn test_acquire_failure() {
        let bus = MockBus::new();
        bus.fail_pin(RIGHT.in2);
        let mut motors = pair(&bus);

        assert!(motors.acquire().is_err());
        assert!(!motors.is_acquired());
    }
}
