//! Settle delays.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Waits between starting a listener, running an exporter and stopping
/// the capture.
pub trait Sleeper: Send + Sync {
    fn sleep_ms(&self, ms: u64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Returns immediately and remembers what it was asked to sleep.
#[derive(Debug, Default, Clone)]
pub struct MockSleeper {
    calls: Arc<Mutex<Vec<u64>>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

impl Sleeper for MockSleeper {
    fn sleep_ms(&self, ms: u64) {
        self.calls.lock().unwrap().push(ms);
    }
}
