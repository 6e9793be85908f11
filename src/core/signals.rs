//! Signal handling: SIGINT/SIGTERM request a cooperative stop.
//!
//! Uses the `signal-hook` crate for safe signal registration. The scan loop and
//! the fix batch poll `SignalHandler::should_stop` between entries rather than
//! blocking on signals, so an in-flight rename always completes.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe stop flag shared between the signal handler and the work loop.
#[derive(Clone)]
pub struct SignalHandler {
    stop_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a new handler and register SIGINT/SIGTERM hooks.
    ///
    /// Registration is best-effort; failures are logged to stderr but not fatal.
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    /// A handler that only responds to `request_stop`.
    pub fn unregistered() -> Self {
        Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a stop has been requested.
    pub fn should_stop(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Programmatically request a stop.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.stop_flag)) {
            eprintln!("[TL-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.stop_flag)) {
            eprintln!("[TL-SIGNAL] failed to register SIGINT: {e}");
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
