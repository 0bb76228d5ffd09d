//! Terminal progress bar driven by reconciler events.

use std::io::{stderr, IsTerminal};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use taskbridge_sync::{ProgressEvent, ProgressSink, TracingSink};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress is drawn only when stderr is an interactive terminal.
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Draws a bar and forwards every event to a `TracingSink`.
pub struct BarSink {
    bar: ProgressBar,
    log: TracingSink,
}

impl BarSink {
    pub fn new(show: bool, verbose: bool) -> Self {
        let bar = ProgressBar::new(0);

        if show {
            match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                Ok(style) => bar.set_style(style.progress_chars("=>-")),
                Err(e) => tracing::debug!("Falling back to default progress style: {}", e),
            }
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }

        Self {
            bar,
            log: TracingSink::new(verbose),
        }
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

impl ProgressSink for BarSink {
    fn emit(&mut self, event: ProgressEvent) {
        match &event {
            ProgressEvent::ExportStarted { total, .. } => {
                self.bar.set_length(*total as u64);
                self.bar.set_message("Exporting");
            }
            ProgressEvent::ItemExported { progress, .. }
            | ProgressEvent::ItemFailed { progress, .. }
            | ProgressEvent::SubtasksSkipped { progress, .. } => {
                self.bar.set_position(progress.processed as u64);
            }
            ProgressEvent::ImportStarted { parent_total, .. } => {
                self.bar.set_length(*parent_total as u64);
                self.bar.set_message("Importing");
            }
            ProgressEvent::PageFetched { fetched, .. } => {
                self.bar.set_position(*fetched as u64);
            }
            ProgressEvent::ChildrenAttached { .. } => self.bar.set_message("Attaching subtasks"),
            ProgressEvent::ExportFinished(_) | ProgressEvent::ImportFinished { .. } => {
                self.bar.finish_and_clear();
            }
            ProgressEvent::IssueSkipped { .. } | ProgressEvent::ChildrenFailed { .. } => {}
        }

        let log = &mut self.log;
        self.bar.suspend(|| log.emit(event));
    }
}
