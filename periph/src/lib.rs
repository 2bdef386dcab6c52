//! # Peripheral interfaces and drivers
//!
//! This library provides the capability traits the line follower is written
//! against, [`SensorArray`] and [`MotorActuator`], along with implementations
//! of them:
//!
//! - [`tlc1543::LineSensorArray`] - the AlphaBot2 reflectance array read
//!   through a bit-banged TLC1543 ADC,
//! - [`dc_motor::DcMotorPair`] - the AlphaBot2's two H-bridge driven DC
//!   motors,
//! - [`sim`] - a simulated line and drivetrain for machines without the
//!   hardware.
//!
//! The hardware drivers are written against `embedded-hal` pins obtained
//! from a [`pins::PinProvider`]. On Raspberry Pi targets the [`rpi`] module
//! provides pins backed by `rppal`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Driver for the H-bridge DC motors.
pub mod dc_motor;

/// Pin and peripheral parameters.
pub mod params;

/// Pin provider abstraction over GPIO backends.
pub mod pins;

/// Raspberry Pi GPIO backend.
#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
pub mod rpi;

/// Simulated peripherals.
pub mod sim;

/// Driver for the TLC1543 10-bit ADC and the line sensor array behind it.
pub mod tlc1543;

#[cfg(test)]
mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

pub use params::PeriphParams;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Raw readings from a sensor array, one per channel ordered left to right.
pub type SensorReading = Vec<u16>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by peripherals.
#[derive(Debug, Error)]
pub enum PeriphError {
    #[error("GPIO pin {pin} could not be opened: {msg}")]
    PinUnavailable { pin: u8, msg: String },

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Peripheral hardware is not supported on this platform")]
    Unsupported,

    #[error("Peripheral has not been acquired")]
    NotAcquired,

    #[error("Motor speed must be between -1.0 and 1.0, found {0}")]
    InvalidSpeed(f64),

    #[error("Peripheral failed to initialise: {0}")]
    InitFailed(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Lifecycle shared by all peripherals.
///
/// Peripherals are constructed unacquired and hold no hardware resources
/// until [`Peripheral::acquire`] is called.
pub trait Peripheral {
    /// Claim the hardware resources of the peripheral.
    ///
    /// Acquiring an already acquired peripheral releases it first and then
    /// acquires it again.
    fn acquire(&mut self) -> Result<(), PeriphError>;

    /// Release the hardware resources. Does nothing if not acquired.
    fn release(&mut self);

    /// Whether the peripheral currently holds its hardware resources.
    fn is_acquired(&self) -> bool;
}

/// An array of sensors read together.
pub trait SensorArray: Peripheral {
    /// Number of channels returned by each poll.
    fn num_channels(&self) -> usize;

    /// Read every channel of the array.
    ///
    /// The returned reading always has [`SensorArray::num_channels`] entries.
    fn poll(&mut self) -> Result<SensorReading, PeriphError>;
}

/// A pair of left/right drive motors.
pub trait MotorActuator: Peripheral {
    /// Set the normalised speed of both motors, each in `[-1, 1]`.
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), PeriphError>;

    /// Bring both motors to zero speed.
    fn stop(&mut self) -> Result<(), PeriphError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Peripheral + ?Sized> Peripheral for Box<T> {
    fn acquire(&mut self) -> Result<(), PeriphError> {
        (**self).acquire()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_acquired(&self) -> bool {
        (**self).is_acquired()
    }
}

impl<T: SensorArray + ?Sized> SensorArray for Box<T> {
    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    fn poll(&mut self) -> Result<SensorReading, PeriphError> {
        (**self).poll()
    }
}

impl<T: MotorActuator + ?Sized> MotorActuator for Box<T> {
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), PeriphError> {
        (**self).set_speeds(left, right)
    }

    fn stop(&mut self) -> Result<(), PeriphError> {
        (**self).stop()
    }
}
