//! # Line control module
//!
//! The line follower's control loop. Each cycle polls the line sensor array,
//! estimates the line offset, converts it into motor speeds and drives the
//! motors, then waits for the poll delay before the next cycle.
//!
//! The loop owns the sensor array and the drive controller (which owns the
//! motors), along with the runtime [`ControlParams`] that can be changed
//! between cycles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::drive_ctrl::{DriveCtrlError, MotorCommand};
use crate::line_est::{LineEstError, LineOffset};
use periph::PeriphError;

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Stage of the control loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LoopState {
    /// Created, peripherals not yet acquired.
    Idle,
    /// Reading the sensor array.
    Polling,
    /// Estimating the line offset.
    Estimating,
    /// Calculating motor speeds.
    Steering,
    /// Writing speeds to the motors.
    Actuating,
    /// Motors stopped and peripherals released.
    Stopped,
}

/// What to do on a cycle where no sensor can see the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoLinePolicy {
    /// Stop both motors until the line is found again.
    Stop,
    /// Keep applying the last command calculated from a line offset. Stops
    /// if the line has never been seen.
    HoldLast,
}

/// Result of a single control cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    /// A command was calculated and sent to the motors.
    Actuated {
        offset: LineOffset,
        cmd: MotorCommand,
        write_ok: bool,
    },

    /// The sensor could not be read so the motors were not written.
    Skipped,
}

/// Possible errors that can occur during LineCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("Could not acquire the robot's peripherals: {0}")]
    PeripheralInit(PeriphError),

    #[error("Line estimation failed: {0}")]
    Estimation(LineEstError),

    #[error("Invalid LineEst parameters: {0}")]
    LineEstInit(LineEstError),

    #[error("Invalid DriveCtrl parameters: {0}")]
    DriveCtrlInit(DriveCtrlError),

    #[error("Invalid LineCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("The control loop has been stopped")]
    Stopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NoLinePolicy {
    fn default() -> Self {
        NoLinePolicy::Stop
    }
}
