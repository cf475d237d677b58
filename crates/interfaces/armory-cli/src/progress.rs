use std::sync::Mutex;

use armory_pipeline::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders engine phases as an indicatif bar, one bar per phase.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the bar for the last phase once the run is over.
    pub fn finish(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for BarProgress {
    fn begin_phase(&self, label: &str, total: u64) {
        let mut slot = self.bar.lock().unwrap();
        if let Some(prev) = slot.take() {
            prev.finish_and_clear();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:30} [{bar:40.green}] {pos}/{len}")
                .unwrap()
                .progress_chars("=> "),
        );
        pb.set_message(label.to_string());
        *slot = Some(pb);
    }

    fn advance(&self, delta: u64) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.inc(delta);
        }
    }
}
