//! # Simulated peripherals
//!
//! A very small kinematic model of the robot over a line, used to exercise
//! the line follower on machines without the hardware. The line's lateral
//! position is tracked in units of sensor spacing relative to the centre of
//! the array. Each poll the line drifts along a sinusoidal curve and moves
//! opposite to the robot's turn.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use log::{debug, trace};
use serde::Deserialize;
use util::maths::{clamp, lin_map};

use crate::{MotorActuator, PeriphError, Peripheral, SensorArray, SensorReading};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulation settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Number of sensors in the simulated array.
    pub num_sensors: usize,

    /// Lateral line movement per poll for a full left/right speed difference.
    ///
    /// Units: sensor spacings
    pub turn_gain: f64,

    /// Peak lateral drift of the line per poll.
    ///
    /// Units: sensor spacings
    pub curve_amplitude: f64,

    /// Number of polls for one full period of the curve.
    pub curve_period_polls: f64,

    /// Width of the line.
    ///
    /// Units: sensor spacings
    pub line_width: f64,

    /// Reading over the line.
    pub black_level: u16,

    /// Reading away from the line.
    pub white_level: u16,
}

/// State shared by the simulated sensor and motors.
#[derive(Debug)]
pub struct SimWorld {
    params: SimParams,
    line_pos: f64,
    num_polls: u64,
    left: f64,
    right: f64,
}

/// Simulated line sensor array.
pub struct SimLineSensor {
    world: Rc<RefCell<SimWorld>>,
    acquired: bool,
}

/// Simulated drive motors.
pub struct SimMotors {
    world: Rc<RefCell<SimWorld>>,
    acquired: bool,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a simulated sensor and motor pair sharing one world.
pub fn sim_pair(params: SimParams) -> (SimLineSensor, SimMotors) {
    let world = Rc::new(RefCell::new(SimWorld::new(params)));

    (
        SimLineSensor { world: world.clone(), acquired: false },
        SimMotors { world, acquired: false },
    )
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            num_sensors: 5,
            turn_gain: 0.5,
            curve_amplitude: 0.02,
            curve_period_polls: 500.0,
            line_width: 0.6,
            black_level: 50,
            white_level: 900,
        }
    }
}

impl SimWorld {
    fn new(params: SimParams) -> Self {
        Self {
            params,
            line_pos: 0.0,
            num_polls: 0,
            left: 0.0,
            right: 0.0,
        }
    }

    /// Advance the model by one poll.
    fn step(&mut self) {
        let phase = TAU * (self.num_polls as f64) / self.params.curve_period_polls;
        let drift = self.params.curve_amplitude * phase.sin();

        // Turning right (left wheel faster) moves the line left
        self.line_pos += drift - self.params.turn_gain * (self.left - self.right);
        self.num_polls += 1;
    }

    /// Readings for the current line position.
    fn readings(&self) -> SensorReading {
        let centre = (self.params.num_sensors as f64 - 1.0) / 2.0;
        let half_width = self.params.line_width / 2.0;
        let black = self.params.black_level as f64;
        let white = self.params.white_level as f64;

        (0..self.params.num_sensors)
            .map(|i| {
                let dist = (i as f64 - (centre + self.line_pos)).abs();
                let v = lin_map((half_width, half_width + 0.5), (black, white), dist);
                clamp(v, black.min(white), black.max(white)).round() as u16
            })
            .collect()
    }
}

impl SimLineSensor {
    /// Lateral position of the line relative to the array centre.
    pub fn line_pos(&self) -> f64 {
        self.world.borrow().line_pos
    }

    /// Move the line to a lateral position relative to the array centre.
    pub fn set_line_pos(&mut self, line_pos: f64) {
        self.world.borrow_mut().line_pos = line_pos;
    }
}

impl SimMotors {
    /// The last (left, right) speeds commanded.
    pub fn speeds(&self) -> (f64, f64) {
        let w = self.world.borrow();
        (w.left, w.right)
    }
}

impl Peripheral for SimLineSensor {
    fn acquire(&mut self) -> Result<(), PeriphError> {
        self.acquired = true;
        debug!("Simulated line sensor acquired");
        Ok(())
    }

    fn release(&mut self) {
        self.acquired = false;
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl SensorArray for SimLineSensor {
    fn num_channels(&self) -> usize {
        self.world.borrow().params.num_sensors
    }

    fn poll(&mut self) -> Result<SensorReading, PeriphError> {
        if !self.acquired {
            return Err(PeriphError::NotAcquired)
        }

        let mut world = self.world.borrow_mut();
        world.step();
        let readings = world.readings();

        trace!("Sim line at {:+.3}: {:?}", world.line_pos, readings);

        Ok(readings)
    }
}

impl Peripheral for SimMotors {
    fn acquire(&mut self) -> Result<(), PeriphError> {
        self.acquired = true;
        debug!("Simulated motors acquired");
        Ok(())
    }

    fn release(&mut self) {
        let mut w = self.world.borrow_mut();
        w.left = 0.0;
        w.right = 0.0;
        self.acquired = false;
    }

    fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl MotorActuator for SimMotors {
    fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), PeriphError> {
        if !self.acquired {
            return Err(PeriphError::NotAcquired)
        }

        for s in [left, right].iter() {
            if !(-1.0..=1.0).contains(s) {
                return Err(PeriphError::InvalidSpeed(*s))
            }
        }

        let mut w = self.world.borrow_mut();
        w.left = left;
        w.right = right;

        Ok(())
    }

    fn stop(&mut self) -> Result<(), PeriphError> {
        match self.acquired {
            true => self.set_speeds(0.0, 0.0),
            false => Ok(())
        }
    }
}
