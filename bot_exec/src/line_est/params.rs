//! Parameters structure for LineEst

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{BLACK_THRESHOLD, FULL_SCALE_PCT, LineEstError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for line position estimation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Raw readings strictly below this value count as the line being under
    /// the sensor.
    pub black_threshold: u16,

    /// Offset reported when the line is only under an outermost sensor.
    ///
    /// Units: percent
    pub full_scale_pct: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            black_threshold: BLACK_THRESHOLD,
            full_scale_pct: FULL_SCALE_PCT,
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn are_valid(&self) -> Result<(), LineEstError> {
        if !(self.full_scale_pct.is_finite() && self.full_scale_pct > 0.0) {
            return Err(LineEstError::InvalidParams(format!(
                "full_scale_pct must be finite and positive, found {}",
                self.full_scale_pct
            )))
        }

        Ok(())
    }
}
