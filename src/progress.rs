//! Stage progress display for provisioning runs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display over the fixed pipeline stages
pub struct StageProgress {
    pb: ProgressBar,
}

impl StageProgress {
    /// Create a new display with the total stage count
    pub fn new(total_stages: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let pb = ProgressBar::new(total_stages);
        pb.set_style(style);
        Self { pb }
    }

    /// Announce the stage about to run
    pub fn stage(&self, name: &str) {
        self.pb.set_message(name.to_string());
    }

    /// Mark the current stage complete
    pub fn complete_stage(&self) {
        self.pb.inc(1);
    }

    /// Finish the bar after the last stage
    pub fn finish(&self) {
        self.pb.finish_with_message("done");
    }

    /// Abandon on fatal error
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}
