use std::io::{self, Write as _};

/// Sink fed a `(completed, total)` pair after each conversation is
/// finalized. Keeps progress display out of the pipeline itself.
pub trait ProgressSink {
    fn advance(&mut self, completed: usize, total: usize);
}

/// Terminal progress bar redrawn in place on each update.
pub struct TerminalProgress {
    width: usize,
}

impl TerminalProgress {
    pub fn new(width: usize) -> Self {
        TerminalProgress { width }
    }
}

impl ProgressSink for TerminalProgress {
    fn advance(&mut self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let filled = self.width * completed / total;
        let percent = 100.0 * completed as f64 / total as f64;
        eprint!(
            "\rProgress: |{}{}| {percent:.1}% Complete",
            "█".repeat(filled),
            "-".repeat(self.width - filled)
        );
        if completed == total {
            eprintln!();
        }
        let _ = io::stderr().flush();
    }
}

/// Discards all updates.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn advance(&mut self, _completed: usize, _total: usize) {}
}
