//! Runtime and static parameters for LineCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::num::ParseFloatError;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NoLinePolicy;
use util::time::millis_to_duration;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default speed both motors run at when the line is centred.
///
/// Units: percent
pub const DEFAULT_BASE_SPEED_PCT: f64 = 10.0;

/// Default wait between control cycles.
///
/// Units: milliseconds
pub const DEFAULT_POLL_DELAY_MS: f64 = 10.0;

/// Longest wait between control cycles that can be requested. The wait is
/// not interrupted by Ctrl-C.
///
/// Units: milliseconds
pub const MAX_POLL_DELAY_MS: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Static parameters for the control loop, loaded from file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Behaviour when no sensor sees the line.
    pub no_line_policy: NoLinePolicy,

    /// Number of consecutive faulty cycles after which the motors are
    /// stopped until a cycle succeeds. Zero disables the limit.
    pub max_consec_faults: u64,
}

/// Parameters which can be changed while the loop is running.
///
/// Only changed through [`ControlParams::set_parameter`] (or
/// [`ControlParams::try_set`]), so both values are always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlParams {
    base_speed_pct: f64,
    poll_delay_ms: f64,
}

/// A request to change a named control parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRequest {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Names of the runtime control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamName {
    /// Wait between cycles, in milliseconds.
    Delay,
    /// Base speed, in percent.
    MainSpeed,
}

/// Reasons a control parameter change can be refused.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Unknown parameter \"{0}\", expected Delay or MainSpeed")]
    UnknownParameter(String),

    #[error("Value \"{value}\" for {name:?} is not a number: {source}")]
    InvalidValue {
        name: ParamName,
        value: String,
        source: ParseFloatError,
    },

    #[error("Value {value} is out of range for {name:?}")]
    OutOfRange {
        name: ParamName,
        value: f64,
    },

    #[error("Expected \"Name Value\" or \"Name=Value\", found \"{0}\"")]
    MalformedRequest(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            no_line_policy: NoLinePolicy::default(),
            max_consec_faults: 50,
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            base_speed_pct: DEFAULT_BASE_SPEED_PCT,
            poll_delay_ms: DEFAULT_POLL_DELAY_MS,
        }
    }
}

impl ControlParams {
    /// Speed both motors run at when the line is centred.
    ///
    /// Units: percent
    pub fn base_speed_pct(&self) -> f64 {
        self.base_speed_pct
    }

    /// Wait between control cycles.
    ///
    /// Units: milliseconds
    pub fn poll_delay_ms(&self) -> f64 {
        self.poll_delay_ms
    }

    /// Wait between control cycles.
    pub fn poll_delay(&self) -> Duration {
        millis_to_duration(self.poll_delay_ms)
    }

    /// Change a parameter by name from its textual value.
    ///
    /// Returns `true` if the change was made. On failure a warning is logged
    /// and the parameter keeps its previous value.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> bool {
        match self.try_set(name, value) {
            Ok(()) => {
                info!("Parameter {} set to {}", name, value.trim());
                true
            },
            Err(e) => {
                warn!("Parameter not changed: {}", e);
                false
            }
        }
    }

    /// Change a parameter by name from its textual value.
    pub fn try_set(&mut self, name: &str, value: &str) -> Result<(), ParamError> {
        let name: ParamName = name.parse()?;

        let v: f64 = value.trim().parse().map_err(|e| ParamError::InvalidValue {
            name,
            value: value.to_string(),
            source: e,
        })?;

        match name {
            ParamName::Delay => {
                if !(0.0..=MAX_POLL_DELAY_MS).contains(&v) {
                    return Err(ParamError::OutOfRange { name, value: v })
                }
                self.poll_delay_ms = v;
            },
            ParamName::MainSpeed => {
                if !v.is_finite() {
                    return Err(ParamError::OutOfRange { name, value: v })
                }
                self.base_speed_pct = v;
            }
        }

        Ok(())
    }
}

impl FromStr for ParamName {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Delay" => Ok(ParamName::Delay),
            "MainSpeed" => Ok(ParamName::MainSpeed),
            other => Err(ParamError::UnknownParameter(other.to_string()))
        }
    }
}

impl FromStr for ParamRequest {
    type Err = ParamError;

    /// Parse either `Name Value` or `Name=Value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let split = s
            .split_once('=')
            .or_else(|| s.split_once(char::is_whitespace));

        match split {
            Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
                Ok(ParamRequest {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                })
            },
            _ => Err(ParamError::MalformedRequest(s.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
