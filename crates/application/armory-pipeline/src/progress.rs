use std::sync::Mutex;

use tracing::{debug, info};

/// Phase-boundary progress interface consumed by the engine. Implementations
/// render however they like; the engine never reads back.
pub trait ProgressReporter: Send + Sync {
    /// A new phase starts; `total` is the number of units it will advance.
    fn begin_phase(&self, label: &str, total: u64);
    /// `delta` more units of the current phase are done.
    fn advance(&self, delta: u64);
}

/// Reporter that discards everything. Handy for tests and embedders that
/// poll state elsewhere.
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn begin_phase(&self, _label: &str, _total: u64) {}
    fn advance(&self, _delta: u64) {}
}

/// Count-based fold of one phase into a 0-100 percentage.
#[derive(Debug)]
pub struct PhaseProgress {
    current: u64,
    total: u64,
}

impl PhaseProgress {
    pub fn new(total: u64) -> Self {
        Self { current: 0, total }
    }

    pub fn add(&mut self, delta: u64) {
        self.current = std::cmp::min(self.total, self.current + delta);
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            (self.current * 100 / self.total) as u8
        }
    }
}

/// Headless reporter: phase transitions at info, per-unit percentages at
/// debug.
#[derive(Default)]
pub struct LogProgress {
    state: Mutex<Option<(String, PhaseProgress)>>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogProgress {
    fn begin_phase(&self, label: &str, total: u64) {
        info!("{label}");
        *self.state.lock().unwrap() = Some((label.to_string(), PhaseProgress::new(total)));
    }

    fn advance(&self, delta: u64) {
        if let Some((label, tracker)) = self.state.lock().unwrap().as_mut() {
            tracker.add(delta);
            debug!("{label} {}%", tracker.percent());
        }
    }
}
