//! Line position estimation module
//!
//! Converts a raw reflectance reading into a signed estimate of where the
//! line lies under the sensor array.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Readings below this value are over the line.
pub const BLACK_THRESHOLD: u16 = 300;

/// Magnitude of the offset when only an outermost sensor sees the line.
pub const FULL_SCALE_PCT: f64 = 100.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LineEst operation.
#[derive(Debug, thiserror::Error)]
pub enum LineEstError {
    #[error("Cannot estimate the line position from an empty sensor reading")]
    InvalidInput,

    #[error("Invalid LineEst parameters: {0}")]
    InvalidParams(String),
}
