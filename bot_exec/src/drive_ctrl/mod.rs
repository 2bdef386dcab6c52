//! # Drive control module
//!
//! Drive control turns a steering demand into speed commands for the left
//! and right motors of a differential drivetrain, enforces the speed limits
//! and forwards the result to the motor actuator it owns.
//!
//! Speeds are expressed in percent of full speed, positive forwards.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_explicit;
mod calc_offset;
mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speed which maps onto a normalised motor demand of 1.0.
///
/// Units: percent
pub const FULL_SPEED_PCT: f64 = 100.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Invalid DriveCtrl parameters: {0}")]
    InvalidParams(String),
}
