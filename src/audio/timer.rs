//! Elapsed-recording timer.
//!
//! Lifecycle is bound to the Recording phase: started on entry, stopped on
//! exit. Restarting overwrites the previous start instant.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::surfaces::SharedSurfaces;

pub struct RecordingTimer {
    task: Option<JoinHandle<()>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Record the current instant and update the timer display once per
    /// second. The display is rendered immediately so the operator sees
    /// `00:00` as soon as recording begins.
    pub fn start(&mut self, surfaces: SharedSurfaces) {
        self.stop();

        let started = Instant::now();
        self.task = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticks.tick().await;
                let text = format_elapsed(started.elapsed());
                surfaces.lock().await.timer.set(text);
            }
        }));
    }

    /// Cancel the periodic update. The display keeps its last value.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for RecordingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render elapsed time as zero-padded `MM:SS`. Minutes are unbounded,
/// seconds wrap at 60.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
