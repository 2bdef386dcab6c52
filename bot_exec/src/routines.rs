//! # Peripheral test routines
//!
//! Bench checks for the robot's peripherals: printing raw ADC readings and
//! sweeping both motors through a sine wave.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::TAU;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::drive_ctrl::DriveCtrl;
use periph::{MotorActuator, PeriphError, SensorArray};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period of the motor test's speed sine wave.
///
/// Units: seconds
pub const MOTOR_TEST_PERIOD_S: f64 = 20.0;

/// Length of the motor test.
///
/// Units: seconds
pub const MOTOR_TEST_DURATION_S: f64 = TAU;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a reading as `0:  512 1: 1023 ...`.
pub fn format_reading(reading: &[u16]) -> String {
    let mut s = String::new();
    for (i, v) in reading.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        // Writing to a String cannot fail
        let _ = write!(s, "{}: {:4}", i, v);
    }
    s
}

/// Repeatedly poll the sensor array and log the raw readings.
///
/// Runs until `running` is cleared. Failing to acquire the array is an
/// error, failed polls are logged and skipped. Returns the number of
/// successful polls.
pub fn adc_test<S: SensorArray>(
    sensor: &mut S,
    delay: Duration,
    running: &AtomicBool,
) -> Result<u64, PeriphError> {
    info!("ADC test on {} channels", sensor.num_channels());

    sensor.acquire()?;

    let mut num_polls = 0;
    while running.load(Ordering::SeqCst) {
        match sensor.poll() {
            Ok(r) => {
                info!("{}", format_reading(&r));
                num_polls += 1;
            },
            Err(e) => warn!("Could not read the ADC: {}", e)
        }

        thread::sleep(delay);
    }

    sensor.release();

    Ok(num_polls)
}

/// Speed demanded of both motors `time_s` seconds into the motor test.
///
/// Units: percent
pub fn motor_test_speed(time_s: f64) -> f64 {
    (TAU * time_s / MOTOR_TEST_PERIOD_S).sin() * 100.0
}

/// Sweep both motors together through a sine wave of speeds.
///
/// Speeds are logged whenever their displayed value changes. The motors are
/// stopped and released at the end, or early if `running` is cleared.
pub fn motor_test<A: MotorActuator>(
    drive_ctrl: &mut DriveCtrl<A>,
    delay: Duration,
    running: &AtomicBool,
) -> Result<(), PeriphError> {
    info!("Motor test");

    drive_ctrl.acquire_actuator()?;

    let start = Instant::now();
    let mut last_disp = String::new();

    loop {
        let time_s = start.elapsed().as_secs_f64();
        if time_s >= MOTOR_TEST_DURATION_S || !running.load(Ordering::SeqCst) {
            break
        }

        let speed = motor_test_speed(time_s);
        let cmd = drive_ctrl.drive(speed, speed);

        let disp = format!(
            "Speed [L, R] = [{:.2}, {:.2}]",
            cmd.left_pct / 100.0,
            cmd.right_pct / 100.0
        );
        if disp != last_disp {
            info!("{}", disp);
            last_disp = disp;
        }

        thread::sleep(delay);
    }

    drive_ctrl.stop();

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::Params;
    use periph::sim::{sim_pair, SimParams};
    use periph::Peripheral;

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(&[512, 7, 1023]), "0:  512 1:    7 2: 1023");
        assert_eq!(format_reading(&[]), "");
    }

    #[test]
    fn test_motor_test_speed() {
        assert_eq!(motor_test_speed(0.0), 0.0);
        assert!((motor_test_speed(5.0) - 100.0).abs() < 1e-9);
        assert!((motor_test_speed(15.0) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_routines_stop_when_cancelled() {
        let (mut sensor, motors) = sim_pair(SimParams::default());
        let running = AtomicBool::new(false);

        assert_eq!(adc_test(&mut sensor, Duration::from_millis(0), &running).unwrap(), 0);
        assert!(!sensor.is_acquired());

        let mut dc = DriveCtrl::new(motors, Params::default()).unwrap();
        motor_test(&mut dc, Duration::from_millis(0), &running).unwrap();
        assert!(!dc.actuator().is_acquired());
        assert_eq!(dc.actuator().speeds(), (0.0, 0.0));
    }
}
