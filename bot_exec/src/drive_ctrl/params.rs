//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{DriveCtrlError, MotorCommand, FULL_SPEED_PCT};
use util::maths::saturate;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Minimum (most reverse) speed that can be demanded of either motor.
    ///
    /// Units: percent
    pub min_speed_pct: f64,

    /// Maximum (most forward) speed that can be demanded of either motor.
    ///
    /// Units: percent
    pub max_speed_pct: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            min_speed_pct: -FULL_SPEED_PCT,
            max_speed_pct: FULL_SPEED_PCT,
        }
    }
}

impl Params {
    /// Check the limits are ordered and within what the actuator accepts.
    pub fn are_valid(&self) -> Result<(), DriveCtrlError> {
        if !(self.min_speed_pct < self.max_speed_pct) {
            return Err(DriveCtrlError::InvalidParams(format!(
                "min_speed_pct ({}) must be less than max_speed_pct ({})",
                self.min_speed_pct, self.max_speed_pct
            )))
        }

        if self.min_speed_pct < -FULL_SPEED_PCT
            || self.max_speed_pct > FULL_SPEED_PCT
        {
            return Err(DriveCtrlError::InvalidParams(format!(
                "speed limits must lie within [-{0}, {0}]", FULL_SPEED_PCT
            )))
        }

        Ok(())
    }

    /// Clamp both sides of a command into the speed limits.
    ///
    /// Returns the limited command along with whether the left and right
    /// speeds respectively had to be limited.
    pub fn enforce_limits(&self, cmd: MotorCommand) -> (MotorCommand, bool, bool) {
        let (left_pct, left_limited) =
            saturate(cmd.left_pct, self.min_speed_pct, self.max_speed_pct);
        let (right_pct, right_limited) =
            saturate(cmd.right_pct, self.min_speed_pct, self.max_speed_pct);

        (MotorCommand { left_pct, right_pct }, left_limited, right_limited)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
