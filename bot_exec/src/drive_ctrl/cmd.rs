//! Drive commands and motor outputs

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::FULL_SPEED_PCT;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A demand on the drivetrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DriveCmd {
    /// Steer towards a line offset while travelling at a base speed.
    ///
    /// A positive offset speeds up the left motor and slows the right one,
    /// turning the robot right.
    Offset {
        offset_pct: f64,
        base_speed_pct: f64,
    },

    /// Drive each motor at the given speed.
    Explicit {
        left_pct: f64,
        right_pct: f64,
    },

    /// Bring both motors to a halt.
    Stop,
}

/// Speeds for the left and right motors.
///
/// Units: percent of full speed, positive forwards
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub left_pct: f64,
    pub right_pct: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotorCommand {
    /// Both motors stopped.
    pub const STOP: MotorCommand = MotorCommand {
        left_pct: 0.0,
        right_pct: 0.0,
    };

    /// The command as normalised `(left, right)` motor demands.
    pub fn normalised(&self) -> (f64, f64) {
        (self.left_pct / FULL_SPEED_PCT, self.right_pct / FULL_SPEED_PCT)
    }

    /// The same command with the left and right sides swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            left_pct: self.right_pct,
            right_pct: self.left_pct,
        }
    }

    /// Whether both motors are stopped.
    pub fn is_stop(&self) -> bool {
        self.left_pct == 0.0 && self.right_pct == 0.0
    }
}
