//! Line offset steering calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{DriveCtrl, MotorCommand};
use periph::MotorActuator;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Split a line offset across the two motors around the base speed.
///
/// The left motor speeds up and the right slows down by the offset, so a
/// line to the right of centre turns the robot right.
pub(crate) fn offset_to_speeds(offset_pct: f64, base_speed_pct: f64) -> MotorCommand {
    MotorCommand {
        left_pct: base_speed_pct + offset_pct,
        right_pct: base_speed_pct - offset_pct,
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: MotorActuator> DriveCtrl<A> {
    /// Calculate the motor command which steers towards a line offset at the
    /// given base speed.
    ///
    /// Both speeds are clamped into the speed limits. Does not touch the
    /// actuator.
    pub fn calc_from_offset(&self, offset_pct: f64, base_speed_pct: f64) -> MotorCommand {
        self.params
            .enforce_limits(offset_to_speeds(offset_pct, base_speed_pct))
            .0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
