//! Signal handling for graceful shutdown

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use log::info;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Set up a Ctrl-C handler which clears the returned flag.
///
/// Loops should check the flag between cycles and exit once it reads
/// `false`.
pub fn setup_ctrl_c_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, stopping");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
