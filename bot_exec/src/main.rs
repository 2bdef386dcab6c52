//! Main AlphaBot2 executable entry point.
//!
//! # Architecture
//!
//! The executable runs one of the following, chosen on the command line:
//!
//!     - `line`: the line follower control loop. Each cycle:
//!         - Line sensor polling
//!         - Line position estimation
//!         - Drive control (steering) processing
//!         - Motor actuation
//!     - `adc`: a raw ADC readout test routine.
//!     - `motor`: a sinusoidal motor sweep test routine.
//!
//! All of them stop cleanly on Ctrl-C. While the line follower runs
//! parameters can be changed by typing `Name Value` lines on stdin.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Std
use std::io::BufRead;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Sender};
use std::thread;

// External
use color_eyre::{Report, eyre::WrapErr};
use log::{debug, error, info, warn};
use structopt::StructOpt;

// Internal
use bot_lib::{
    drive_ctrl::{self, DriveCtrl},
    line_ctrl::{self, LineCtrl, ParamRequest},
    line_est,
    routines,
};
use periph::{MotorActuator, PeriphError, PeriphParams, SensorArray};
use util::{
    host,
    logger::{logger_init, parse_level, LevelFilter},
    session::Session,
    signal::setup_ctrl_c_handler,
    time::millis_to_duration,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// AlphaBot2 line follower and peripheral test routines.
#[derive(Debug, StructOpt)]
#[structopt(name = "bot_exec")]
struct Opts {
    /// Use simulated peripherals instead of the robot's hardware.
    #[structopt(long)]
    sim: bool,

    /// Minimum level of messages to log (info, debug or trace).
    #[structopt(long, default_value = "debug", parse(try_from_str = parse_level))]
    log_level: LevelFilter,

    /// Set a control parameter before starting, as `Name=Value`. Known
    /// parameters are Delay (ms) and MainSpeed (%).
    #[structopt(short = "s", long = "set", number_of_values = 1)]
    set: Vec<ParamRequest>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Follow a line.
    #[structopt(name = "line")]
    Line {
        /// Wait between control cycles in milliseconds.
        delay_ms: Option<String>,
    },

    /// Print raw ADC readings.
    #[structopt(name = "adc")]
    Adc {
        /// Wait between readings in milliseconds.
        #[structopt(default_value = "10")]
        delay_ms: f64,

        /// Number of ADC channels to read, starting from channel 0.
        #[structopt(default_value = "11")]
        num_channels: u8,
    },

    /// Sweep both motors through a sine wave of speeds.
    #[structopt(name = "motor")]
    Motor {
        /// Wait between speed updates in milliseconds.
        #[structopt(default_value = "10")]
        delay_ms: f64,
    },
}

type Sensor = Box<dyn SensorArray>;
type Motors = Box<dyn MotorActuator>;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "bot_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("AlphaBot2 Executable\n");
    info!("Running on: {}", host::describe());
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let periph_params: PeriphParams = util::params::load(
        "periph.toml"
    ).wrap_err("Could not load peripheral params")?;

    info!("Exec parameters loaded");

    // ---- SIGNAL HANDLING ----

    let running = setup_ctrl_c_handler()
        .wrap_err("Failed to set the Ctrl-C handler")?;

    // ---- RUN ----

    let result = match opts.cmd {
        Command::Line { ref delay_ms } => run_line(
            &opts, delay_ms.as_deref(), &periph_params, &running, &session
        ),
        Command::Adc { delay_ms, num_channels } => run_adc(
            opts.sim, delay_ms, num_channels, &periph_params, &running
        ),
        Command::Motor { delay_ms } => run_motor(
            opts.sim, delay_ms, &periph_params, &running
        ),
    };

    // ---- SHUTDOWN ----

    if let Err(ref e) = result {
        error!("{:#}", e);
    }

    info!("End of execution");

    session.exit();

    result
}

/// Run the line follower until Ctrl-C.
fn run_line(
    opts: &Opts,
    delay_ms: Option<&str>,
    periph_params: &PeriphParams,
    running: &AtomicBool,
    session: &Session,
) -> Result<(), Report> {

    let line_est_params: line_est::Params = util::params::load(
        "line_est.toml"
    ).wrap_err("Could not load LineEst params")?;
    let drive_ctrl_params: drive_ctrl::Params = util::params::load(
        "drive_ctrl.toml"
    ).wrap_err("Could not load DriveCtrl params")?;
    let line_ctrl_params: line_ctrl::Params = util::params::load(
        "line_ctrl.toml"
    ).wrap_err("Could not load LineCtrl params")?;

    let (sensor, motors) = open_peripherals(opts.sim, periph_params)
        .wrap_err("Failed to initialise the peripherals")?;

    let mut line_ctrl = LineCtrl::new(
        sensor,
        motors,
        line_est_params,
        drive_ctrl_params,
        line_ctrl_params,
    ).wrap_err("Failed to initialise LineCtrl")?;

    // The delay argument must be valid, refused `--set` overrides keep their
    // defaults
    if let Some(d) = delay_ms {
        line_ctrl.try_set_parameter("Delay", d)
            .wrap_err_with(|| format!("Invalid poll delay \"{}\"", d))?;
    }
    for req in opts.set.iter() {
        line_ctrl.set_parameter(&req.name, &req.value);
    }

    let (param_tx, param_rx) = mpsc::channel();
    spawn_param_reader(param_tx);

    let report = line_ctrl.run(running, &param_rx)
        .wrap_err("Line following failed")?;

    info!(
        "{} cycles, {} transient faults, {} without a line",
        report.num_cycles, report.num_transient_faults, report.num_no_line
    );
    session.save("line_ctrl/report.json", report);

    Ok(())
}

/// Run the ADC readout test routine until Ctrl-C.
fn run_adc(
    sim: bool,
    delay_ms: f64,
    num_channels: u8,
    periph_params: &PeriphParams,
    running: &AtomicBool,
) -> Result<(), Report> {

    let params = PeriphParams {
        line_channels: (0..num_channels).collect(),
        ..periph_params.clone()
    };

    let (mut sensor, _) = open_peripherals(sim, &params)
        .wrap_err("Failed to initialise the peripherals")?;

    let num_polls = routines::adc_test(&mut sensor, millis_to_duration(delay_ms), running)
        .wrap_err("ADC test failed")?;

    info!("{} readings taken", num_polls);

    Ok(())
}

/// Run the motor sweep test routine.
fn run_motor(
    sim: bool,
    delay_ms: f64,
    periph_params: &PeriphParams,
    running: &AtomicBool,
) -> Result<(), Report> {

    let (_, motors) = open_peripherals(sim, periph_params)
        .wrap_err("Failed to initialise the peripherals")?;

    let mut drive_ctrl = DriveCtrl::new(motors, drive_ctrl::Params::default())
        .wrap_err("Failed to initialise DriveCtrl")?;

    routines::motor_test(&mut drive_ctrl, millis_to_duration(delay_ms), running)
        .wrap_err("Motor test failed")?;

    Ok(())
}

/// Create the line sensor array and motors, simulated or real.
fn open_peripherals(sim: bool, params: &PeriphParams)
    -> Result<(Sensor, Motors), PeriphError>
{
    if sim {
        info!("Using simulated peripherals");
        let (sensor, motors) = periph::sim::sim_pair(params.sim);
        return Ok((Box::new(sensor), Box::new(motors)))
    }

    open_hardware(params)
}

#[cfg(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64")))]
fn open_hardware(params: &PeriphParams) -> Result<(Sensor, Motors), PeriphError> {
    let sensor = periph::rpi::line_sensor_array(params)?;
    let motors = periph::rpi::motor_pair(params)?;

    Ok((Box::new(sensor), Box::new(motors)))
}

#[cfg(not(all(target_os = "linux", any(target_arch = "arm", target_arch = "aarch64"))))]
fn open_hardware(_params: &PeriphParams) -> Result<(Sensor, Motors), PeriphError> {
    warn!("Robot hardware is only available on the Raspberry Pi, use --sim on this host");
    Err(PeriphError::Unsupported)
}

/// Forward `Name Value` lines typed on stdin to the control loop.
fn spawn_param_reader(tx: Sender<ParamRequest>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break
            };

            if line.trim().is_empty() {
                continue
            }

            match line.parse::<ParamRequest>() {
                Ok(req) => if tx.send(req).is_err() {
                    break
                },
                Err(e) => warn!("{}", e)
            }
        }
    });
}
