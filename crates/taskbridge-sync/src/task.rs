//! Local task file model.
//!
//! The file is a JSON object with a `tasks` array. Parents may carry a
//! `subtasks` array one level deep; subtask ids are unique only among their
//! siblings.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Deferred,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Deferred => "deferred",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
    /// Set only on subtasks, to the owning parent's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<u64>,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Task>) -> Self {
        self.subtasks = subtasks;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    pub tasks: Vec<Task>,
}

impl TaskFile {
    /// Check the structural rules the reconcilers rely on.
    pub fn validate(&self) -> Result<(), String> {
        check_unique_ids(&self.tasks, "task")?;

        for task in &self.tasks {
            if task.parent_task_id.is_some() {
                return Err(format!("task {} is top-level but has a parentTaskId", task.id));
            }
            check_unique_ids(&task.subtasks, &format!("subtask of task {}", task.id))?;
            if let Some(nested) = task.subtasks.iter().find(|s| !s.subtasks.is_empty()) {
                return Err(format!(
                    "subtask {} of task {} has its own subtasks",
                    nested.id, task.id
                ));
            }
        }

        Ok(())
    }

    pub fn subtask_count(&self) -> usize {
        self.tasks.iter().map(|t| t.subtasks.len()).sum()
    }
}

fn check_unique_ids(tasks: &[Task], what: &str) -> Result<(), String> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id) {
            return Err(format!("duplicate {} id {}", what, task.id));
        }
    }
    Ok(())
}

/// Read and validate a task file.
pub fn read_task_file(path: &Path) -> Result<TaskFile, SyncError> {
    let malformed = |reason: String| SyncError::MalformedTaskFile {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let file: TaskFile = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
    file.validate().map_err(malformed)?;

    tracing::debug!(
        "Read {} tasks and {} subtasks from {}",
        file.tasks.len(),
        file.subtask_count(),
        path.display()
    );
    Ok(file)
}

/// Write a task file as two-space indented JSON with a trailing newline.
pub fn write_task_file(path: &Path, file: &TaskFile) -> Result<(), SyncError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut content = serde_json::to_string_pretty(file)
        .map_err(|e| SyncError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    content.push('\n');
    std::fs::write(path, content)?;

    tracing::info!("Wrote {} tasks to {}", file.tasks.len(), path.display());
    Ok(())
}
