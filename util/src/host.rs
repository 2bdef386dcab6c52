//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "ALPHABOT_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software.
///
/// This is the value of `ALPHABOT_SW_ROOT` if it is set, otherwise the current
/// working directory.
pub fn get_sw_root() -> std::io::Result<PathBuf> {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => env::current_dir()
    }
}

/// Returns true if the executable was built for a Raspberry Pi class target
/// (ARM Linux).
pub fn is_rpi_target() -> bool {
    cfg!(all(
        target_os = "linux",
        any(target_arch = "arm", target_arch = "aarch64")
    ))
}

/// A short description of the host, used in the startup banner.
pub fn describe() -> String {
    format!(
        "{} {} ({})",
        env::consts::OS,
        env::consts::ARCH,
        if is_rpi_target() { "hardware" } else { "no hardware" }
    )
}
