//! Ctrl-C handling
//!
//! The first Ctrl-C asks the running batch to stop before its next request.
//! A second one exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn install() -> anyhow::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);

    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted again, exiting.");
            std::process::exit(1);
        }
        eprintln!("\nStopping after the current request (Ctrl-C again to quit now)...");
    })?;

    Ok(flag)
}
