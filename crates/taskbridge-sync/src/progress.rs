//! Structured progress events emitted by the reconcilers.
//!
//! Reconcilers never print. They hand events to a `ProgressSink`, and the
//! caller decides whether those become log lines, a progress bar, or a
//! recorded list for assertions.

use taskbridge_jira::UpsertOutcome;

use crate::export::ExportSummary;

/// Items handled so far against the total computed up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Fraction complete in `0.0..=1.0`; an empty run counts as complete.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.processed.min(self.total) as f64) / (self.total as f64)
    }

    pub fn percent(&self) -> u8 {
        (self.ratio() * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Parent,
    Subtask,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Parent => "task",
            ItemKind::Subtask => "subtask",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ExportStarted {
        project_key: String,
        parents: usize,
        total: usize,
    },
    ItemExported {
        kind: ItemKind,
        task_id: u64,
        title: String,
        outcome: UpsertOutcome,
        key: String,
        progress: Progress,
    },
    ItemFailed {
        kind: ItemKind,
        task_id: u64,
        title: String,
        error: String,
        progress: Progress,
    },
    /// The child issue type could not be resolved, so none of the parent's
    /// subtasks were attempted.
    SubtasksSkipped {
        parent_id: u64,
        count: usize,
        error: String,
        progress: Progress,
    },
    ExportFinished(ExportSummary),

    ImportStarted {
        project_key: String,
        parent_total: usize,
    },
    PageFetched {
        start_at: usize,
        returned: usize,
        fetched: usize,
        total: usize,
    },
    IssueSkipped {
        key: String,
        error: String,
    },
    ChildrenAttached {
        parent_id: u64,
        count: usize,
    },
    ChildrenFailed {
        parent_id: u64,
        error: String,
    },
    ImportFinished {
        tasks: usize,
        subtasks: usize,
        skipped: usize,
    },
}

pub trait ProgressSink: Send {
    fn emit(&mut self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Collects events in order. Mostly useful in tests.
impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Turns events into log records.
///
/// Per-item events log at `info` when `verbose` is set and at `debug`
/// otherwise. Failures always log at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    verbose: bool,
}

impl TracingSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressSink for TracingSink {
    fn emit(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::ExportStarted {
                project_key,
                parents,
                total,
            } => tracing::info!(
                "Exporting {} tasks ({} items total) to {}",
                parents,
                total,
                project_key
            ),
            ProgressEvent::ItemExported {
                kind,
                task_id,
                title,
                outcome,
                key,
                progress,
            } => {
                let verb = match outcome {
                    UpsertOutcome::Created => "Created",
                    UpsertOutcome::Updated => "Updated",
                };
                if self.verbose {
                    tracing::info!(
                        "[{:>3}%] {} {} {} {}: {}",
                        progress.percent(),
                        verb,
                        kind.label(),
                        task_id,
                        key,
                        title
                    );
                } else {
                    tracing::debug!("{} {} {} as {}", verb, kind.label(), task_id, key);
                }
            }
            ProgressEvent::ItemFailed {
                kind,
                task_id,
                error,
                ..
            } => tracing::warn!("Failed to export {} {}: {}", kind.label(), task_id, error),
            ProgressEvent::SubtasksSkipped {
                parent_id,
                count,
                error,
                ..
            } => tracing::warn!(
                "Skipped {} subtasks of task {}: {}",
                count,
                parent_id,
                error
            ),
            ProgressEvent::ExportFinished(summary) => tracing::info!(
                "Export finished: {} created, {} updated, {} errors",
                summary.created,
                summary.updated,
                summary.errors
            ),
            ProgressEvent::ImportStarted {
                project_key,
                parent_total,
            } => tracing::info!("Importing {} issues from {}", parent_total, project_key),
            ProgressEvent::PageFetched { fetched, total, .. } => {
                if self.verbose {
                    tracing::info!("Fetched {}/{} issues", fetched, total);
                } else {
                    tracing::debug!("Fetched {}/{} issues", fetched, total);
                }
            }
            ProgressEvent::IssueSkipped { key, error } => {
                tracing::warn!("Skipped issue {}: {}", key, error)
            }
            ProgressEvent::ChildrenAttached { parent_id, count } => {
                tracing::debug!("Attached {} subtasks to task {}", count, parent_id)
            }
            ProgressEvent::ChildrenFailed { parent_id, error } => tracing::warn!(
                "Could not fetch subtasks of task {}: {}",
                parent_id,
                error
            ),
            ProgressEvent::ImportFinished {
                tasks,
                subtasks,
                skipped,
            } => tracing::info!(
                "Import finished: {} tasks, {} subtasks, {} skipped",
                tasks,
                subtasks,
                skipped
            ),
        }
    }
}
