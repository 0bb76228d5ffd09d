//! Push the local task tree to the remote tracker.

use std::collections::HashMap;

use taskbridge_jira::{IssueGateway, UpsertOutcome};
use tracing::instrument;

use crate::identity::{subtask_tag, subtask_to_draft, task_to_draft};
use crate::progress::{ItemKind, Progress, ProgressEvent, ProgressSink};
use crate::task::Task;
use crate::SyncOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

impl ExportSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

/// Upsert every task, then every subtask under its parent's remote key.
///
/// Individual failures are counted in `errors` and never stop the run.
/// Subtasks of a parent that failed to upsert are not attempted. Subtask
/// tags carry no parent component, so a subtask id already exported under
/// another parent in the same run is reported as a failure, not upserted.
#[instrument(skip_all, fields(project = %options.project_key, tasks = tasks.len()))]
pub async fn export_tasks(
    gateway: &dyn IssueGateway,
    tasks: &[Task],
    options: &SyncOptions,
    sink: &mut dyn ProgressSink,
) -> ExportSummary {
    let project_key = options.project_key.as_str();
    let total = tasks.len() + tasks.iter().map(|t| t.subtasks.len()).sum::<usize>();
    let mut processed = 0;
    let mut summary = ExportSummary::default();
    let mut remote_keys: HashMap<u64, String> = HashMap::new();
    let mut claimed_tags: HashMap<String, u64> = HashMap::new();

    sink.emit(ProgressEvent::ExportStarted {
        project_key: project_key.to_string(),
        parents: tasks.len(),
        total,
    });

    for task in tasks {
        let result = gateway.upsert_issue(&task_to_draft(task, project_key)).await;
        processed += 1;
        let progress = Progress { processed, total };

        match result {
            Ok(upserted) => {
                summary.record(upserted.outcome);
                remote_keys.insert(task.id, upserted.key.clone());
                sink.emit(ProgressEvent::ItemExported {
                    kind: ItemKind::Parent,
                    task_id: task.id,
                    title: task.title.clone(),
                    outcome: upserted.outcome,
                    key: upserted.key,
                    progress,
                });
            }
            Err(e) => {
                summary.errors += 1;
                sink.emit(ProgressEvent::ItemFailed {
                    kind: ItemKind::Parent,
                    task_id: task.id,
                    title: task.title.clone(),
                    error: e.to_string(),
                    progress,
                });
            }
        }
    }

    for task in tasks.iter().filter(|t| !t.subtasks.is_empty()) {
        let Some(parent_key) = remote_keys.get(&task.id) else {
            tracing::debug!(
                "Skipping {} subtasks of task {}: parent was not exported",
                task.subtasks.len(),
                task.id
            );
            continue;
        };

        let type_id = match gateway.resolve_subtask_type_id(project_key).await {
            Ok(id) => id,
            Err(e) => {
                let count = task.subtasks.len();
                processed += count;
                summary.errors += count;
                sink.emit(ProgressEvent::SubtasksSkipped {
                    parent_id: task.id,
                    count,
                    error: e.to_string(),
                    progress: Progress { processed, total },
                });
                continue;
            }
        };

        for subtask in &task.subtasks {
            let tag = subtask_tag(subtask.id);
            if let Some(owner) = claimed_tags.get(&tag) {
                processed += 1;
                summary.errors += 1;
                sink.emit(ProgressEvent::ItemFailed {
                    kind: ItemKind::Subtask,
                    task_id: subtask.id,
                    title: subtask.title.clone(),
                    error: format!("identity tag {} already used by task {}", tag, owner),
                    progress: Progress { processed, total },
                });
                continue;
            }
            claimed_tags.insert(tag, task.id);

            let draft = subtask_to_draft(subtask, project_key, parent_key, &type_id);
            let result = gateway.upsert_issue(&draft).await;
            processed += 1;
            let progress = Progress { processed, total };

            match result {
                Ok(upserted) => {
                    summary.record(upserted.outcome);
                    sink.emit(ProgressEvent::ItemExported {
                        kind: ItemKind::Subtask,
                        task_id: subtask.id,
                        title: subtask.title.clone(),
                        outcome: upserted.outcome,
                        key: upserted.key,
                        progress,
                    });
                }
                Err(e) => {
                    summary.errors += 1;
                    sink.emit(ProgressEvent::ItemFailed {
                        kind: ItemKind::Subtask,
                        task_id: subtask.id,
                        title: subtask.title.clone(),
                        error: e.to_string(),
                        progress,
                    });
                }
            }
        }
    }

    sink.emit(ProgressEvent::ExportFinished(summary));
    summary
}
