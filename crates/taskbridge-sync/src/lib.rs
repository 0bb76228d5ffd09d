//! Reconciliation between a local task file and a remote issue tracker.
//!
//! Export pushes the local tree in two passes (parents, then children under
//! their resolved parent keys). Import pages through parent issues and then
//! attaches each parent's children.

pub mod error;
pub mod export;
pub mod identity;
pub mod import;
pub mod progress;
pub mod report;
pub mod task;

#[cfg(test)]
mod testing;

pub use error::SyncError;
pub use export::{export_tasks, ExportSummary};
pub use import::{import_tasks, ImportResult, RemoteKeys};
pub use progress::{ItemKind, NoopSink, Progress, ProgressEvent, ProgressSink, TracingSink};
pub use task::{read_task_file, write_task_file, Priority, Task, TaskFile, TaskStatus};

/// Settings shared by both reconcilers for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub project_key: String,
    /// Issues requested per search page
    pub page_size: usize,
}

impl SyncOptions {
    pub fn new(project_key: impl Into<String>, page_size: usize) -> Self {
        Self {
            project_key: project_key.into(),
            page_size: page_size.max(1),
        }
    }
}
