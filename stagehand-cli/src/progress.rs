//! Terminal rendering of sync progress.

use std::cell::Cell;

use colored::Colorize;

use stagehand_sync::progress::percent;
use stagehand_sync::{Phase, ProgressSink};

/// Writes phase changes and percentages to stderr.
#[derive(Default)]
pub struct TerminalProgress {
    percent: Cell<u8>,
}

impl ProgressSink for TerminalProgress {
    fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Done => {}
            Phase::Cancelling => eprintln!("{}", "cancelling…".yellow().bold()),
            other => eprintln!("[{:>3}%] {}", self.percent.get(), other.label()),
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.percent.set(percent(completed, total));
        eprintln!(
            "[{:>3}%] {completed}/{total} unit(s) staged",
            self.percent.get()
        );
    }

    fn on_unit(&self, label: &str) {
        eprintln!("[{:>3}%] asset {}", self.percent.get(), label.bold());
    }
}
