//! Progress reporting for bulk resyncs.

use std::time::Instant;

use tracing::info;

/// Receives progress of one resync run.
pub trait ProgressReporter: Send {
    /// A run over `total` records is starting.
    fn start(&mut self, label: &str, total: usize);

    /// `count` more records were processed.
    fn advance(&mut self, count: usize);

    /// The run is over.
    fn finish(&mut self);
}

/// Reports progress through `tracing`, logging whenever another tenth of the
/// records has been processed.
#[derive(Debug, Default)]
pub struct LogProgress {
    label: String,
    total: usize,
    done: usize,
    last_decile: usize,
    started: Option<Instant>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> usize {
        self.done
    }

    fn decile(&self) -> usize {
        if self.total == 0 {
            return 10;
        }
        (self.done.min(self.total) * 10) / self.total
    }
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, label: &str, total: usize) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        self.last_decile = 0;
        self.started = Some(Instant::now());
        info!(index = %self.label, total = total, "Sync started");
    }

    fn advance(&mut self, count: usize) {
        self.done += count;
        let decile = self.decile();
        if decile > self.last_decile {
            self.last_decile = decile;
            info!(
                index = %self.label,
                done = self.done,
                total = self.total,
                percent = decile * 10,
                "Sync progress"
            );
        }
    }

    fn finish(&mut self) {
        let elapsed_ms = self
            .started
            .map(|started| started.elapsed().as_millis())
            .unwrap_or_default();
        info!(
            index = %self.label,
            done = self.done,
            total = self.total,
            elapsed_ms = elapsed_ms as u64,
            "Sync finished"
        );
    }
}
