//! Pull a project's issues into a local task tree.

use std::collections::HashMap;

use taskbridge_jira::IssueGateway;
use tracing::instrument;

use crate::error::SyncError;
use crate::identity::issue_to_task;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::task::Task;
use crate::SyncOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Parents in remote key order, each with its children attached.
    pub tasks: Vec<Task>,
    pub subtask_count: usize,
    /// Issues dropped because their key carries no numeric id.
    pub skipped: usize,
    pub keys: RemoteKeys,
}

/// Remote keys of imported issues. Subtasks are looked up under their
/// parent since subtask ids may repeat across parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteKeys {
    parents: HashMap<u64, String>,
    subtasks: HashMap<(u64, u64), String>,
}

impl RemoteKeys {
    pub fn insert_parent(&mut self, id: u64, key: impl Into<String>) {
        self.parents.insert(id, key.into());
    }

    pub fn insert_subtask(&mut self, parent_id: u64, id: u64, key: impl Into<String>) {
        self.subtasks.insert((parent_id, id), key.into());
    }

    pub fn parent(&self, id: u64) -> Option<&str> {
        self.parents.get(&id).map(String::as_str)
    }

    pub fn subtask(&self, parent_id: u64, id: u64) -> Option<&str> {
        self.subtasks.get(&(parent_id, id)).map(String::as_str)
    }
}

/// Fetch every top-level issue page by page, then attach each parent's
/// children.
///
/// Failing to count or page through parents aborts the import. Failing to
/// fetch one parent's children only leaves that parent without subtasks.
#[instrument(skip_all, fields(project = %options.project_key))]
pub async fn import_tasks(
    gateway: &dyn IssueGateway,
    options: &SyncOptions,
    sink: &mut dyn ProgressSink,
) -> Result<ImportResult, SyncError> {
    let project_key = options.project_key.as_str();
    let page_size = options.page_size.max(1);

    let parent_total = gateway.count_issues(project_key, false).await?;
    sink.emit(ProgressEvent::ImportStarted {
        project_key: project_key.to_string(),
        parent_total,
    });

    let mut result = ImportResult::default();
    let mut parents: Vec<(String, Task)> = Vec::with_capacity(parent_total.min(page_size));
    let mut fetched = 0;

    while fetched < parent_total {
        let page = gateway
            .fetch_issues_page(project_key, fetched, page_size, false)
            .await?;

        if page.is_empty() {
            tracing::warn!(
                "Search returned no issues at offset {} of {}; stopping early",
                fetched,
                parent_total
            );
            break;
        }

        let start_at = fetched;
        fetched += page.len();
        sink.emit(ProgressEvent::PageFetched {
            start_at,
            returned: page.len(),
            fetched,
            total: parent_total,
        });

        for issue in page {
            match issue_to_task(&issue, false) {
                Ok(task) => parents.push((issue.key, task)),
                Err(e) => {
                    result.skipped += 1;
                    sink.emit(ProgressEvent::IssueSkipped {
                        key: issue.key,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    for (key, task) in &mut parents {
        let children = match gateway.fetch_children(key).await {
            Ok(children) => children,
            Err(e) => {
                tracing::error!("Failed to fetch subtasks of {}: {}", key, e);
                sink.emit(ProgressEvent::ChildrenFailed {
                    parent_id: task.id,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let mut subtasks = Vec::with_capacity(children.len());
        for child in children {
            match issue_to_task(&child, true) {
                Ok(mut subtask) => {
                    subtask.parent_task_id = Some(task.id);
                    result.keys.insert_subtask(task.id, subtask.id, child.key);
                    subtasks.push(subtask);
                }
                Err(e) => {
                    result.skipped += 1;
                    sink.emit(ProgressEvent::IssueSkipped {
                        key: child.key,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !subtasks.is_empty() {
            result.subtask_count += subtasks.len();
            sink.emit(ProgressEvent::ChildrenAttached {
                parent_id: task.id,
                count: subtasks.len(),
            });
        }
        task.subtasks = subtasks;
    }

    result.tasks = Vec::with_capacity(parents.len());
    for (key, task) in parents {
        result.keys.insert_parent(task.id, key);
        result.tasks.push(task);
    }
    sink.emit(ProgressEvent::ImportFinished {
        tasks: result.tasks.len(),
        subtasks: result.subtask_count,
        skipped: result.skipped,
    });

    Ok(result)
}
