//! Explicit speed calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{DriveCtrl, MotorCommand};
use periph::MotorActuator;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: MotorActuator> DriveCtrl<A> {
    /// Calculate the motor command for explicit left and right speeds.
    ///
    /// Speeds at or beyond a limit are pinned to it. Does not touch the
    /// actuator.
    pub fn calc_explicit(&self, left_pct: f64, right_pct: f64) -> MotorCommand {
        self.params
            .enforce_limits(MotorCommand { left_pct, right_pct })
            .0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::Params;
    use periph::sim::{sim_pair, SimParams};

    #[test]
    fn test_explicit_clamp() {
        let dc = DriveCtrl::new(sim_pair(SimParams::default()).1, Params::default()).unwrap();

        assert_eq!(
            dc.calc_explicit(150.0, -150.0),
            MotorCommand { left_pct: 100.0, right_pct: -100.0 }
        );
        assert_eq!(
            dc.calc_explicit(-100.0, 100.0),
            MotorCommand { left_pct: -100.0, right_pct: 100.0 }
        );
        assert_eq!(
            dc.calc_explicit(12.5, -7.0),
            MotorCommand { left_pct: 12.5, right_pct: -7.0 }
        );
        assert_eq!(dc.calc_explicit(f64::NAN, 0.0), MotorCommand::STOP);
    }

    #[test]
    fn test_custom_limits() {
        let params = Params { min_speed_pct: -20.0, max_speed_pct: 60.0 };
        let dc = DriveCtrl::new(sim_pair(SimParams::default()).1, params).unwrap();

        assert_eq!(
            dc.calc_explicit(70.0, -70.0),
            MotorCommand { left_pct: 60.0, right_pct: -20.0 }
        );
    }
}
