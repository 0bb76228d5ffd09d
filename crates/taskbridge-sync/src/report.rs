//! Markdown summary of an import run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::import::RemoteKeys;
use crate::task::Task;

pub const DEFAULT_REPORT_DIR: &str = "tasks/import_reports";

const DESCRIPTION_LIMIT: usize = 50;
const DESCRIPTION_KEEP: usize = 47;

pub fn report_file_name(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S_Import_Report.md").to_string()
}

/// Keys come from `keys`; an id with no recorded key is shown as
/// `<project>-<id>`.
pub fn render_import_report(
    tasks: &[Task],
    keys: &RemoteKeys,
    subtask_count: usize,
    project_key: &str,
    now: DateTime<Utc>,
) -> String {
    let fallback = |id: u64| format!("{}-{}", project_key, id);

    let mut out = String::from("# Jira Import Report\n\n");
    out.push_str(&format!("**Date:** {}\n\n", now.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("**Project:** {}\n\n", project_key));
    out.push_str(&format!(
        "**Summary:** Imported {} tasks and {} subtasks\n\n",
        tasks.len(),
        subtask_count
    ));

    out.push_str("## Tasks\n\n");
    out.push_str("| Key | Title | Description | Status | Subtasks |\n");
    out.push_str("| --- | ----- | ----------- | ------ | -------- |\n");
    for task in tasks {
        let key = keys.parent(task.id).map_or_else(|| fallback(task.id), str::to_string);
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            key,
            cell(&task.title),
            description_cell(task.description.as_deref()),
            task.status,
            task.subtasks.len()
        ));
    }

    for task in tasks.iter().filter(|t| !t.subtasks.is_empty()) {
        let key = keys.parent(task.id).map_or_else(|| fallback(task.id), str::to_string);
        out.push_str(&format!("\n### Subtasks for {}\n\n", key));
        out.push_str("| Key | Title | Description | Status |\n");
        out.push_str("| --- | ----- | ----------- | ------ |\n");
        for sub in &task.subtasks {
            let sub_key = keys
                .subtask(task.id, sub.id)
                .map_or_else(|| fallback(sub.id), str::to_string);
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                sub_key,
                cell(&sub.title),
                description_cell(sub.description.as_deref()),
                sub.status
            ));
        }
    }

    out
}

/// Render the report into `dir`, creating it if needed. Returns the file path.
pub fn write_import_report(
    dir: &Path,
    tasks: &[Task],
    keys: &RemoteKeys,
    subtask_count: usize,
    project_key: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, SyncError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(now));
    std::fs::write(&path, render_import_report(tasks, keys, subtask_count, project_key, now))?;
    tracing::debug!("Wrote import report to {}", path.display());
    Ok(path)
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn description_cell(description: Option<&str>) -> String {
    let Some(text) = description.filter(|d| !d.is_empty()) else {
        return String::new();
    };

    if text.chars().count() > DESCRIPTION_LIMIT {
        let kept: String = text.chars().take(DESCRIPTION_KEEP).collect();
        cell(&format!("{}...", kept))
    } else {
        cell(text)
    }
}
