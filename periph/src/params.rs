//! # Peripheral Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::sim::SimParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing how the peripherals are wired.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeriphParams {
    /// Pins connected to the TLC1543 ADC.
    pub adc: AdcPins,

    /// ADC channels of the line sensors, ordered left to right.
    pub line_channels: Vec<u8>,

    /// Pins of the left motor.
    pub motor_left: MotorPins,

    /// Pins of the right motor.
    pub motor_right: MotorPins,

    /// Frequency of the motor speed PWM.
    ///
    /// Units: hertz
    pub pwm_frequency_hz: f64,

    /// Settings for the simulated peripherals.
    pub sim: SimParams,
}

/// BCM GPIO numbers of the TLC1543 interface.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdcPins {
    /// Address input
    pub addr: u8,
    /// Chip select
    pub cs: u8,
    /// Data out
    pub dout: u8,
    /// I/O clock
    pub clk: u8,
}

/// BCM GPIO numbers of one H-bridge channel.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MotorPins {
    /// Speed (enable) pin, driven with PWM
    pub pwm: u8,
    /// First direction input
    pub in1: u8,
    /// Second direction input
    pub in2: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PeriphParams {
    /// AlphaBot2-Pi wiring.
    fn default() -> Self {
        Self {
            adc: AdcPins {
                addr: 24,
                cs: 5,
                dout: 23,
                clk: 25,
            },
            line_channels: vec![0, 1, 2, 3, 4],
            motor_left: MotorPins {
                pwm: 6,
                in1: 12,
                in2: 13,
            },
            motor_right: MotorPins {
                pwm: 26,
                in1: 20,
                in2: 21,
            },
            pwm_frequency_hz: 50.0,
            sim: SimParams::default(),
        }
    }
}
