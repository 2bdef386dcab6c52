//! # AlphaBot2 line follower library
//!
//! The processing modules of the line follower:
//!
//! - [`line_est`] - estimating where the line is under the sensor array,
//! - [`drive_ctrl`] - turning steering demands into motor speeds,
//! - [`line_ctrl`] - the control loop tying them to the peripherals,
//! - [`routines`] - peripheral test routines.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Drive control module
pub mod drive_ctrl;

/// Line following control loop
pub mod line_ctrl;

/// Line position estimation module
pub mod line_est;

/// Peripheral test routines
pub mod routines;
