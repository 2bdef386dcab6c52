//! Implementations for the LineCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Std
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Instant;

// External
use log::{debug, error, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    ControlParams, CycleOutcome, LineCtrlError, LoopState, NoLinePolicy,
    ParamError, ParamRequest, Params,
};
use crate::drive_ctrl::{self, DriveCmd, DriveCtrl, MotorCommand};
use crate::line_est::{self, LineEst};
use periph::{MotorActuator, SensorArray};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line following control loop
pub struct LineCtrl<S: SensorArray, A: MotorActuator> {
    state: LoopState,

    params: Params,
    ctrl_params: ControlParams,

    sensor: S,
    line_est: LineEst,
    drive_ctrl: DriveCtrl<A>,

    /// Last command calculated from a line offset.
    last_line_cmd: Option<MotorCommand>,

    num_consec_faults: u64,
    safe_stopped: bool,

    report: LineCtrlReport,
}

/// Running totals for the control loop, saved at the end of a session.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct LineCtrlReport {
    /// Number of cycles started.
    pub num_cycles: u64,

    /// Number of cycles which sent a command to the motors.
    pub num_actuated: u64,

    /// Number of cycles skipped because the sensor could not be read.
    pub num_skipped: u64,

    /// Number of sensor read or motor write failures.
    pub num_transient_faults: u64,

    /// Number of motor write failures.
    pub num_write_failures: u64,

    /// Number of cycles on which the line could not be seen.
    pub num_no_line: u64,

    /// Number of cycles on which a speed had to be limited.
    pub num_limited: u64,

    /// Number of accepted parameter changes.
    pub num_param_changes: u64,

    /// Number of times the motors were stopped for too many consecutive
    /// faults.
    pub num_safe_stops: u64,

    /// Offset estimated on the last actuated cycle.
    pub last_offset: Option<f64>,

    /// Command sent on the last actuated cycle.
    pub last_cmd: Option<MotorCommand>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S: SensorArray, A: MotorActuator> LineCtrl<S, A> {
    /// Create a new control loop.
    ///
    /// The peripherals are not acquired until the first cycle.
    pub fn new(
        sensor: S,
        motors: A,
        line_est_params: line_est::Params,
        drive_ctrl_params: drive_ctrl::Params,
        params: Params,
    ) -> Result<Self, LineCtrlError> {
        let line_est = LineEst::new(line_est_params)
            .map_err(LineCtrlError::LineEstInit)?;
        let drive_ctrl = DriveCtrl::new(motors, drive_ctrl_params)
            .map_err(LineCtrlError::DriveCtrlInit)?;

        if sensor.num_channels() == 0 {
            return Err(LineCtrlError::InvalidParams(
                "the sensor array has no channels".into()
            ))
        }

        Ok(Self {
            state: LoopState::Idle,
            params,
            ctrl_params: ControlParams::default(),
            sensor,
            line_est,
            drive_ctrl,
            last_line_cmd: None,
            num_consec_faults: 0,
            safe_stopped: false,
            report: LineCtrlReport::default(),
        })
    }

    /// Run control cycles until `running` is cleared or a fatal error occurs.
    ///
    /// Parameter change requests received on `requests` are applied between
    /// cycles. The loop is stopped before returning, whatever the outcome.
    pub fn run(&mut self, running: &AtomicBool, requests: &Receiver<ParamRequest>)
        -> Result<LineCtrlReport, LineCtrlError>
    {
        info!(
            "Line following started (base speed {} %, poll delay {} ms)",
            self.ctrl_params.base_speed_pct(),
            self.ctrl_params.poll_delay_ms()
        );

        let result = loop {
            if !running.load(Ordering::SeqCst) {
                info!("Stop requested");
                break Ok(())
            }

            // ---- PARAMETER CHANGES ----

            while let Ok(req) = requests.try_recv() {
                self.set_parameter(&req.name, &req.value);
            }

            // ---- CYCLE ----

            let delay = self.ctrl_params.poll_delay();
            let cycle_start = Instant::now();

            if let Err(e) = self.cycle() {
                error!("Fatal error in the control loop: {}", e);
                break Err(e)
            }

            trace!("Cycle took {:.06} s", cycle_start.elapsed().as_secs_f64());

            thread::sleep(delay);
        };

        self.stop();

        info!("Line following ended after {} cycles", self.report.num_cycles);

        result.map(|_| self.report)
    }

    /// Perform a single control cycle.
    ///
    /// A sensor read failure skips the rest of the cycle, leaving the motors
    /// at their last demand. A motor write failure is counted but the cycle
    /// still completes.
    pub fn cycle(&mut self) -> Result<CycleOutcome, LineCtrlError> {
        if self.state == LoopState::Stopped {
            return Err(LineCtrlError::Stopped)
        }

        // Both sides of the drivetrain must see the same parameters
        let ctrl_params = self.ctrl_params;

        self.report.num_cycles += 1;

        // ---- POLLING ----

        self.set_state(LoopState::Polling);
        self.acquire_peripherals()?;

        let reading = match self.sensor.poll() {
            Ok(r) => r,
            Err(e) => {
                self.transient_fault(&format!("Could not read the line sensor: {}", e));
                self.report.num_skipped += 1;
                return Ok(CycleOutcome::Skipped)
            }
        };

        // ---- ESTIMATING ----

        self.set_state(LoopState::Estimating);

        let (offset, est_report) = self.line_est.proc(&reading)
            .map_err(LineCtrlError::Estimation)?;

        trace!("Detections: {:?}", est_report.detections);

        // ---- STEERING ----

        self.set_state(LoopState::Steering);

        let drive_cmd = match offset {
            Some(offset_pct) => DriveCmd::Offset {
                offset_pct,
                base_speed_pct: ctrl_params.base_speed_pct(),
            },
            None => {
                self.report.num_no_line += 1;
                self.no_line_cmd()
            }
        };

        let cmd = self.drive_ctrl.calc(&drive_cmd);
        if offset.is_some() {
            self.last_line_cmd = Some(cmd);
        }

        // ---- ACTUATING ----

        self.set_state(LoopState::Actuating);

        let drive_report = self.drive_ctrl.actuate(&cmd);

        if drive_report.left_limited || drive_report.right_limited {
            self.report.num_limited += 1;
        }
        self.report.num_write_failures = drive_report.num_write_failures;

        let write_ok = !drive_report.last_write_failed;
        if write_ok {
            self.clear_faults();
        }
        else {
            self.transient_fault("Could not write to the motors");
        }

        self.report.num_actuated += 1;
        self.report.last_offset = offset;
        self.report.last_cmd = Some(cmd);

        Ok(CycleOutcome::Actuated { offset, cmd, write_ok })
    }

    /// Stop the motors and release the peripherals.
    ///
    /// Once stopped the loop cannot be cycled again.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return
        }

        self.drive_ctrl.stop();
        self.sensor.release();
        self.set_state(LoopState::Stopped);

        info!("Line follower stopped");
    }

    /// Change a runtime control parameter by name.
    ///
    /// Returns `true` if the change was made.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> bool {
        let changed = self.ctrl_params.set_parameter(name, value);
        if changed {
            self.report.num_param_changes += 1;
        }
        changed
    }

    /// Change a runtime control parameter by name, returning why a refused
    /// change was refused.
    pub fn try_set_parameter(&mut self, name: &str, value: &str)
        -> Result<(), ParamError>
    {
        self.ctrl_params.try_set(name, value)?;
        self.report.num_param_changes += 1;
        info!("Parameter {} set to {}", name, value.trim());
        Ok(())
    }

    /// The current runtime control parameters.
    pub fn ctrl_params(&self) -> ControlParams {
        self.ctrl_params
    }

    /// The current stage of the loop.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Running totals of the loop.
    pub fn report(&self) -> LineCtrlReport {
        self.report
    }

    /// The owned sensor array.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The owned sensor array, mutably.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// The owned drive controller.
    pub fn drive_ctrl(&self) -> &DriveCtrl<A> {
        &self.drive_ctrl
    }

    /// The owned drive controller, mutably.
    pub fn drive_ctrl_mut(&mut self) -> &mut DriveCtrl<A> {
        &mut self.drive_ctrl
    }

    fn set_state(&mut self, state: LoopState) {
        if state != self.state {
            trace!("LineCtrl {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Acquire any peripheral which is not yet acquired.
    fn acquire_peripherals(&mut self) -> Result<(), LineCtrlError> {
        if !self.sensor.is_acquired() {
            self.sensor.acquire().map_err(LineCtrlError::PeripheralInit)?;
            debug!("Line sensor acquired ({} channels)", self.sensor.num_channels());
        }

        self.drive_ctrl.acquire_actuator()
            .map_err(LineCtrlError::PeripheralInit)
    }

    /// The drive command to use when the line cannot be seen.
    fn no_line_cmd(&self) -> DriveCmd {
        match (self.params.no_line_policy, self.last_line_cmd) {
            (NoLinePolicy::HoldLast, Some(last)) => DriveCmd::Explicit {
                left_pct: last.left_pct,
                right_pct: last.right_pct,
            },
            _ => DriveCmd::Stop
        }
    }

    /// Record a fault which does not end the loop.
    fn transient_fault(&mut self, msg: &str) {
        warn!("{}", msg);

        self.report.num_transient_faults += 1;
        self.num_consec_faults += 1;

        let limit = self.params.max_consec_faults;
        if limit > 0 && self.num_consec_faults >= limit && !self.safe_stopped {
            error!(
                "{} consecutive faults, stopping the motors until a cycle succeeds",
                self.num_consec_faults
            );
            self.safe_stopped = true;
            self.report.num_safe_stops += 1;

            let stop = self.drive_ctrl.calc(&DriveCmd::Stop);
            self.drive_ctrl.actuate(&stop);
            self.report.num_write_failures = self.drive_ctrl.num_write_failures();
        }
    }

    fn clear_faults(&mut self) {
        if self.safe_stopped {
            info!("Control cycle succeeded, resuming line following");
        }
        self.num_consec_faults = 0;
        self.safe_stopped = false;
    }
}

impl<S: SensorArray, A: MotorActuator> Drop for LineCtrl<S, A> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use periph::sim::{sim_pair, SimLineSensor, SimMotors, SimParams};
    use periph::Peripheral;

    fn sim_loop(params: Params) -> LineCtrl<SimLineSensor, SimMotors> {
        let (sensor, motors) = sim_pair(SimParams {
            curve_amplitude: 0.0,
            turn_gain: 0.0,
            ..SimParams::default()
        });

        LineCtrl::new(
            sensor,
            motors,
            line_est::Params::default(),
            drive_ctrl::Params::default(),
            params,
        ).unwrap()
    }

    #[test]
    fn test_states() {
        let mut lc = sim_loop(Params::default());
        assert_eq!(lc.state(), LoopState::Idle);

        lc.cycle().unwrap();
        assert_eq!(lc.state(), LoopState::Actuating);
        assert!(lc.sensor().is_acquired());

        lc.stop();
        assert_eq!(lc.state(), LoopState::Stopped);
        assert!(!lc.sensor().is_acquired());
        assert!(matches!(lc.cycle(), Err(LineCtrlError::Stopped)));
    }

    #[test]
    fn test_centred_line() {
        let mut lc = sim_loop(Params::default());

        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { offset, cmd, write_ok } => {
                assert_eq!(offset, Some(0.0));
                assert_eq!(cmd, MotorCommand { left_pct: 10.0, right_pct: 10.0 });
                assert!(write_ok);
            },
            o => panic!("Unexpected outcome {:?}", o)
        }

        assert_eq!(lc.drive_ctrl().actuator().speeds(), (0.1, 0.1));
    }

    #[test]
    fn test_steers_towards_line() {
        let mut lc = sim_loop(Params::default());

        lc.sensor_mut().set_line_pos(2.0);

        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { offset, cmd, .. } => {
                assert_eq!(offset, Some(100.0));
                assert_eq!(cmd, MotorCommand { left_pct: 100.0, right_pct: -90.0 });
            },
            o => panic!("Unexpected outcome {:?}", o)
        }
    }

    #[test]
    fn test_no_line_policies() {
        // Stop
        let mut lc = sim_loop(Params::default());
        lc.cycle().unwrap();
        lc.sensor_mut().set_line_pos(10.0);
        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { offset: None, cmd, .. } => assert!(cmd.is_stop()),
            o => panic!("Unexpected outcome {:?}", o)
        }
        assert_eq!(lc.report().num_no_line, 1);

        // Hold last
        let mut lc = sim_loop(Params {
            no_line_policy: NoLinePolicy::HoldLast,
            ..Params::default()
        });
        lc.sensor_mut().set_line_pos(-2.0);
        lc.cycle().unwrap();
        lc.sensor_mut().set_line_pos(-10.0);
        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { offset: None, cmd, .. } => {
                assert_eq!(cmd, MotorCommand { left_pct: -90.0, right_pct: 100.0 })
            },
            o => panic!("Unexpected outcome {:?}", o)
        }
    }

    #[test]
    fn test_hold_last_without_line_stops() {
        let mut lc = sim_loop(Params {
            no_line_policy: NoLinePolicy::HoldLast,
            ..Params::default()
        });
        lc.sensor_mut().set_line_pos(10.0);

        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { cmd, .. } => assert!(cmd.is_stop()),
            o => panic!("Unexpected outcome {:?}", o)
        }
    }

    #[test]
    fn test_parameter_changes() {
        let mut lc = sim_loop(Params::default());

        assert!(lc.set_parameter("MainSpeed", "40"));
        assert!(!lc.set_parameter("MainSpeed", "forty"));
        assert_eq!(lc.ctrl_params().base_speed_pct(), 40.0);
        assert_eq!(lc.report().num_param_changes, 1);

        assert!(matches!(
            lc.try_set_parameter("Delay", "1e300"),
            Err(ParamError::OutOfRange { .. })
        ));
        assert!(matches!(
            lc.try_set_parameter("Delay", "soon"),
            Err(ParamError::InvalidValue { .. })
        ));
        lc.try_set_parameter("Delay", "25").unwrap();
        assert_eq!(lc.ctrl_params().poll_delay_ms(), 25.0);
        assert_eq!(lc.report().num_param_changes, 2);

        match lc.cycle().unwrap() {
            CycleOutcome::Actuated { cmd, .. } => {
                assert_eq!(cmd, MotorCommand { left_pct: 40.0, right_pct: 40.0 })
            },
            o => panic!("Unexpected outcome {:?}", o)
        }
    }
}
