//! Mapping between local tasks and remote issues.
//!
//! Identity travels as a label on the remote issue: `taskmaster-<id>` for
//! parents and `taskmaster-subtask-<id>` for children. Going the other way,
//! the local id is read off the numeric part of the issue key.

use taskbridge_jira::{doc_to_text, text_to_doc, IssueDraft, IssueTypeSelector, RemoteIssue};

use crate::error::SyncError;
use crate::task::{Task, TaskStatus};

/// Issue type name used for top-level tasks.
pub const PARENT_ISSUE_TYPE: &str = "Story";

pub fn parent_tag(task_id: u64) -> String {
    format!("taskmaster-{}", task_id)
}

pub fn subtask_tag(subtask_id: u64) -> String {
    format!("taskmaster-subtask-{}", subtask_id)
}

/// Local id for a remote key: leading non-digits are dropped and the first
/// run of digits is parsed, so `PROJ-42` gives 42 and `ABC-0007` gives 7.
pub fn derive_local_id(key: &str) -> Result<u64, SyncError> {
    let rest = key.trim_start_matches(|c: char| !c.is_ascii_digit());
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    rest[..end]
        .parse()
        .map_err(|_| SyncError::MalformedKey(key.to_string()))
}

/// Collapse a remote status name onto the three local states.
pub fn classify_status(name: &str) -> TaskStatus {
    let name = name.to_lowercase();
    if name.contains("done") || name.contains("complete") || name.contains("closed") {
        TaskStatus::Done
    } else if name.contains("defer") || name.contains("backlog") {
        TaskStatus::Deferred
    } else {
        TaskStatus::Pending
    }
}

pub fn task_to_draft(task: &Task, project_key: &str) -> IssueDraft {
    IssueDraft {
        project_key: project_key.to_string(),
        summary: task.title.clone(),
        description: text_to_doc(task.description.as_deref()),
        issue_type: IssueTypeSelector::Name(PARENT_ISSUE_TYPE.to_string()),
        parent_key: None,
        labels: vec![parent_tag(task.id)],
    }
}

pub fn subtask_to_draft(
    subtask: &Task,
    project_key: &str,
    parent_key: &str,
    subtask_type_id: &str,
) -> IssueDraft {
    IssueDraft {
        project_key: project_key.to_string(),
        summary: subtask.title.clone(),
        description: text_to_doc(subtask.description.as_deref()),
        issue_type: IssueTypeSelector::Id(subtask_type_id.to_string()),
        parent_key: Some(parent_key.to_string()),
        labels: vec![subtask_tag(subtask.id)],
    }
}

/// Build a local task from a fetched issue.
///
/// With `is_subtask`, the issue's parent key (when present) becomes the
/// task's `parent_task_id`.
pub fn issue_to_task(issue: &RemoteIssue, is_subtask: bool) -> Result<Task, SyncError> {
    let fields = &issue.fields;

    let parent_task_id = match (&fields.parent, is_subtask) {
        (Some(parent), true) => Some(derive_local_id(&parent.key)?),
        _ => None,
    };

    Ok(Task {
        id: derive_local_id(&issue.key)?,
        title: fields.summary.clone(),
        description: fields.description.as_ref().and_then(doc_to_text),
        status: fields
            .status
            .as_ref()
            .map(|s| classify_status(&s.name))
            .unwrap_or_default(),
        parent_task_id,
        ..Default::default()
    })
}
