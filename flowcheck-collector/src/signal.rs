//! Stop signals.
//!
//! [`ShutdownFlag`] is raised by Ctrl+C. [`StopSignal`] is the flag a
//! [`CaptureHandle`](crate::session::CaptureHandle) shares with its capture
//! thread. Both are read through [`ShutdownCheck`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Polled by loops that must end on request.
pub trait ShutdownCheck: Send + Sync {
    fn should_stop(&self) -> bool;
}

/// Set by SIGINT.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Create the flag and install the Ctrl+C handler.
    ///
    /// Only one handler can be installed per process; if that fails the
    /// flag still works through [`trigger`](Self::trigger).
    pub fn new() -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = flag.clone();
        let _ = ctrlc::set_handler(move || {
            handler_flag.store(true, Ordering::SeqCst);
        });
        Self { flag }
    }

    /// Create the flag without installing a handler.
    pub fn manual() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCheck for ShutdownFlag {
    fn should_stop(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One-way stop flag shared between an orchestrator and a capture thread.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl ShutdownCheck for StopSignal {
    fn should_stop(&self) -> bool {
        self.is_stopped()
    }
}

/// Never asks to stop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverShutdown;

impl ShutdownCheck for NeverShutdown {
    fn should_stop(&self) -> bool {
        false
    }
}

/// Asks to stop on the first poll.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysShutdown;

impl ShutdownCheck for AlwaysShutdown {
    fn should_stop(&self) -> bool {
        true
    }
}

/// Lets a loop run `polls` times, then asks it to stop.
#[derive(Debug, Clone)]
pub struct CountingShutdown {
    remaining: Arc<AtomicUsize>,
}

impl CountingShutdown {
    pub fn after(polls: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(polls)),
        }
    }
}

impl ShutdownCheck for CountingShutdown {
    fn should_stop(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }
}
