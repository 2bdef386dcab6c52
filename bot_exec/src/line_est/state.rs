//! Implementations for the LineEst state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{LineEstError, Params};
use periph::SensorReading;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Signed position of the line relative to the centre of the array.
///
/// Negative values mean the line is to the left of centre, positive to the
/// right. `None` if no sensor can see the line.
///
/// Units: percent, in `[-full_scale_pct, full_scale_pct]`
pub type LineOffset = Option<f64>;

/// Line estimation module state
#[derive(Default)]
pub struct LineEst {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Status report for LineEst processing.
#[derive(Clone, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Per-sensor black/not-black classification of the last reading.
    pub detections: Vec<bool>,

    /// Number of sensors which saw the line.
    pub num_hits: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LineEst {
    type InitData = Params;
    type InitError = LineEstError;

    type InputData = SensorReading;
    type OutputData = LineOffset;
    type StatusReport = StatusReport;
    type ProcError = LineEstError;

    /// Initialise the LineEst module.
    fn init(&mut self, init_data: Self::InitData)
        -> Result<(), Self::InitError>
    {
        init_data.are_valid()?;
        self.params = init_data;

        Ok(())
    }

    /// Estimate the line offset for a single reading.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let offset = self.estimate_offset(input_data)?;

        let detections = self.detections(input_data);
        self.report = StatusReport {
            num_hits: detections.iter().filter(|d| **d).count(),
            detections,
        };

        trace!("LineEst: {:?} -> {:?}", input_data, offset);

        Ok((offset, self.report.clone()))
    }
}

impl LineEst {
    /// Create a new estimator with the given parameters.
    pub fn new(params: Params) -> Result<Self, LineEstError> {
        let mut line_est = Self::default();
        line_est.init(params)?;
        Ok(line_est)
    }

    /// The estimator's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether a single raw value means the line is under that sensor.
    pub fn is_black(&self, value: u16) -> bool {
        value < self.params.black_threshold
    }

    /// Classify every sensor in the reading as over the line or not.
    pub fn detections(&self, readings: &[u16]) -> Vec<bool> {
        readings.iter().map(|v| self.is_black(*v)).collect()
    }

    /// Estimate the signed offset of the line from a raw reading.
    ///
    /// Each sensor over the line contributes its signed distance from the
    /// centre of the array. The mean distance is scaled so that the line
    /// being under only an outermost sensor gives `±full_scale_pct`.
    ///
    /// Returns `Ok(None)` if no sensor sees the line and
    /// `Err(LineEstError::InvalidInput)` for an empty reading.
    pub fn estimate_offset(&self, readings: &[u16])
        -> Result<LineOffset, LineEstError>
    {
        if readings.is_empty() {
            return Err(LineEstError::InvalidInput)
        }

        let centre = (readings.len() - 1) as f64 / 2.0;

        let (sum, num_hits) = readings
            .iter()
            .enumerate()
            .filter(|(_, v)| self.is_black(**v))
            .fold((0f64, 0usize), |(sum, n), (i, _)| {
                (sum + (i as f64 - centre), n + 1)
            });

        if num_hits == 0 {
            return Ok(None)
        }

        // A single sensor is always at the centre
        if centre == 0.0 {
            return Ok(Some(0.0))
        }

        let scale = self.params.full_scale_pct / centre;

        Ok(Some(sum / num_hits as f64 * scale))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
