//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{calc_offset::offset_to_speeds, DriveCmd, DriveCtrlError, MotorCommand, Params};
use periph::{MotorActuator, PeriphError};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
pub struct DriveCtrl<A: MotorActuator> {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    actuator: A,

    pub(crate) current_cmd: Option<DriveCmd>,

    pub(crate) output: Option<MotorCommand>,

    num_write_failures: u64,
}

/// Status report for DriveCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The left speed had to be limited.
    pub left_limited: bool,

    /// The right speed had to be limited.
    pub right_limited: bool,

    /// The last command could not be written to the motors.
    pub last_write_failed: bool,

    /// Number of motor writes which have failed since creation.
    pub num_write_failures: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: MotorActuator> State for DriveCtrl<A> {
    type InitData = Params;
    type InitError = DriveCtrlError;

    type InputData = DriveCmd;
    type OutputData = MotorCommand;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    fn init(&mut self, init_data: Self::InitData)
        -> Result<(), Self::InitError>
    {
        init_data.are_valid()?;
        self.params = init_data;

        Ok(())
    }

    /// Calculate the motor command for a drive command and send it to the
    /// motors.
    ///
    /// Failing to write to the motors is not an error, the failure is
    /// recorded in the status report instead.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let cmd = self.calc(input_data);
        let report = self.actuate(&cmd);

        Ok((cmd, report))
    }
}

impl<A: MotorActuator> DriveCtrl<A> {
    /// Create a new controller owning the given (unacquired) actuator.
    pub fn new(actuator: A, params: Params) -> Result<Self, DriveCtrlError> {
        let mut drive_ctrl = Self {
            params: Params::default(),
            report: StatusReport::default(),
            actuator,
            current_cmd: None,
            output: None,
            num_write_failures: 0,
        };
        drive_ctrl.init(params)?;

        Ok(drive_ctrl)
    }

    /// Calculate the limited motor command for a drive command.
    ///
    /// Clears the status report and raises the limit flags as needed. Does
    /// not touch the actuator.
    pub fn calc(&mut self, cmd: &DriveCmd) -> MotorCommand {
        self.report = StatusReport {
            num_write_failures: self.num_write_failures,
            ..StatusReport::default()
        };
        self.current_cmd = Some(*cmd);

        let raw = match *cmd {
            DriveCmd::Offset { offset_pct, base_speed_pct } => {
                offset_to_speeds(offset_pct, base_speed_pct)
            },
            DriveCmd::Explicit { left_pct, right_pct } => {
                MotorCommand { left_pct, right_pct }
            },
            DriveCmd::Stop => MotorCommand::STOP
        };

        let (limited, left_limited, right_limited) = self.params.enforce_limits(raw);
        self.report.left_limited = left_limited;
        self.report.right_limited = right_limited;

        trace!("DriveCtrl: {:?} -> {:?}", cmd, limited);

        limited
    }

    /// Write a motor command to the actuator, acquiring it first if needed.
    ///
    /// Errors are logged and counted in the returned status report rather
    /// than propagated, the motors keep whatever demand they last accepted.
    pub fn actuate(&mut self, cmd: &MotorCommand) -> StatusReport {
        self.output = Some(*cmd);

        let result = match self.acquire_actuator() {
            Ok(()) => {
                let (left, right) = cmd.normalised();
                self.actuator.set_speeds(left, right)
            },
            Err(e) => Err(e)
        };

        match result {
            Ok(()) => self.report.last_write_failed = false,
            Err(e) => {
                self.num_write_failures += 1;
                self.report.last_write_failed = true;
                warn!(
                    "Could not write {:?} to the motors ({} failures so far): {}",
                    cmd, self.num_write_failures, e
                );
            }
        }
        self.report.num_write_failures = self.num_write_failures;

        self.report
    }

    /// Drive each motor at an explicit speed.
    pub fn drive(&mut self, left_pct: f64, right_pct: f64) -> MotorCommand {
        let cmd = self.calc(&DriveCmd::Explicit { left_pct, right_pct });
        self.actuate(&cmd);
        cmd
    }

    /// Acquire the actuator if it is not already acquired.
    pub fn acquire_actuator(&mut self) -> Result<(), PeriphError> {
        if !self.actuator.is_acquired() {
            debug!("Acquiring motors");
            self.actuator.acquire()?;
        }

        Ok(())
    }

    /// Zero both motors and release the actuator.
    ///
    /// Does nothing to the motors if the actuator was never acquired.
    pub fn stop(&mut self) {
        self.current_cmd = Some(DriveCmd::Stop);

        if self.actuator.is_acquired() {
            if let Err(e) = self.actuator.stop() {
                warn!("Could not stop the motors: {}", e);
            }
            self.actuator.release();
            debug!("Motors stopped and released");
        }

        self.output = Some(MotorCommand::STOP);
    }

    /// The controller's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The status report of the last calculation and write.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// The last drive command calculated.
    pub fn current_cmd(&self) -> Option<DriveCmd> {
        self.current_cmd
    }

    /// The last command sent (or attempted) to the motors.
    pub fn output(&self) -> Option<MotorCommand> {
        self.output
    }

    /// Number of motor writes which have failed.
    pub fn num_write_failures(&self) -> u64 {
        self.num_write_failures
    }

    /// The owned actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The owned actuator, mutably.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use periph::Peripheral;

    /// Motors which record demands and can be told to fail.
    #[derive(Default)]
    struct FakeMotors {
        acquired: bool,
        num_acquires: usize,
        fail_acquire: bool,
        fail_write: bool,
        speeds: Option<(f64, f64)>,
    }

    impl Peripheral for FakeMotors {
        fn acquire(&mut self) -> Result<(), PeriphError> {
            self.num_acquires += 1;
            if self.fail_acquire {
                return Err(PeriphError::InitFailed("no motors".into()))
            }
            self.acquired = true;
            Ok(())
        }

        fn release(&mut self) {
            self.acquired = false;
        }

        fn is_acquired(&self) -> bool {
            self.acquired
        }
    }

    impl MotorActuator for FakeMotors {
        fn set_speeds(&mut self, left: f64, right: f64) -> Result<(), PeriphError> {
            if self.fail_write {
                return Err(PeriphError::Gpio("bus fault".into()))
            }
            self.speeds = Some((left, right));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), PeriphError> {
            self.set_speeds(0.0, 0.0)
        }
    }

    fn drive_ctrl(motors: FakeMotors) -> DriveCtrl<FakeMotors> {
        DriveCtrl::new(motors, Params::default()).unwrap()
    }

    #[test]
    fn test_proc_offset() {
        let mut dc = drive_ctrl(FakeMotors::default());

        let (cmd, report) = dc.proc(&DriveCmd::Offset {
            offset_pct: 30.0,
            base_speed_pct: 10.0,
        }).unwrap();

        assert_eq!(cmd, MotorCommand { left_pct: 40.0, right_pct: -20.0 });
        assert!(!report.left_limited && !report.right_limited);
        assert!(!report.last_write_failed);

        // Lazily acquired and scaled into [-1, 1]
        assert!(dc.actuator().is_acquired());
        assert_eq!(dc.actuator().speeds, Some((0.4, -0.2)));
    }

    #[test]
    fn test_proc_limited() {
        let mut dc = drive_ctrl(FakeMotors::default());

        let (cmd, report) = dc.proc(&DriveCmd::Offset {
            offset_pct: 100.0,
            base_speed_pct: 20.0,
        }).unwrap();

        assert_eq!(cmd, MotorCommand { left_pct: 100.0, right_pct: -80.0 });
        assert!(report.left_limited);
        assert!(!report.right_limited);
        assert_eq!(dc.actuator().speeds, Some((1.0, -0.8)));
    }

    #[test]
    fn test_proc_stop() {
        let mut dc = drive_ctrl(FakeMotors::default());

        dc.drive(50.0, 50.0);
        let (cmd, _) = dc.proc(&DriveCmd::Stop).unwrap();

        assert!(cmd.is_stop());
        assert_eq!(dc.actuator().speeds, Some((0.0, 0.0)));
    }

    #[test]
    fn test_write_failure_counted() {
        let mut dc = drive_ctrl(FakeMotors {
            fail_write: true,
            ..FakeMotors::default()
        });

        let (cmd, report) = dc.proc(&DriveCmd::Explicit {
            left_pct: 25.0,
            right_pct: 25.0,
        }).unwrap();

        // The command is still produced
        assert_eq!(cmd, MotorCommand { left_pct: 25.0, right_pct: 25.0 });
        assert!(report.last_write_failed);
        assert_eq!(report.num_write_failures, 1);

        dc.actuator_mut().fail_write = false;
        let report = dc.actuate(&cmd);
        assert!(!report.last_write_failed);
        assert_eq!(report.num_write_failures, 1);
        assert_eq!(dc.num_write_failures(), 1);
    }

    #[test]
    fn test_lazy_acquire_failure_counted() {
        let mut dc = drive_ctrl(FakeMotors {
            fail_acquire: true,
            ..FakeMotors::default()
        });

        let report = dc.actuate(&MotorCommand { left_pct: 10.0, right_pct: 10.0 });
        assert!(report.last_write_failed);
        assert_eq!(dc.num_write_failures(), 1);
        assert_eq!(dc.actuator().speeds, None);
    }

    #[test]
    fn test_acquire_once() {
        let mut dc = drive_ctrl(FakeMotors::default());

        dc.drive(10.0, 10.0);
        dc.drive(20.0, 20.0);
        dc.acquire_actuator().unwrap();

        assert_eq!(dc.actuator().num_acquires, 1);
    }

    #[test]
    fn test_stop_releases() {
        let mut dc = drive_ctrl(FakeMotors::default());

        dc.drive(60.0, -60.0);
        dc.stop();

        assert!(!dc.actuator().is_acquired());
        assert_eq!(dc.actuator().speeds, Some((0.0, 0.0)));
        assert_eq!(dc.output(), Some(MotorCommand::STOP));
    }

    #[test]
    fn test_invalid_params() {
        let params = Params { min_speed_pct: 10.0, max_speed_pct: 10.0 };
        assert!(DriveCtrl::new(FakeMotors::default(), params).is_err());
    }
}
