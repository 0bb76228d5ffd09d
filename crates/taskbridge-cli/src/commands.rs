use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use taskbridge_core::Config;
use taskbridge_jira::{JiraClient, JiraClientOptions};
use taskbridge_sync::report::write_import_report;
use taskbridge_sync::{
    export_tasks, import_tasks, read_task_file, write_task_file, ExportSummary, SyncOptions,
    TaskFile,
};

use crate::cli::{Cli, Command};
use crate::progress::{should_show_progress, BarSink};

/// Connected client plus the options every reconciler run needs.
struct Session {
    client: JiraClient,
    options: SyncOptions,
}

impl Session {
    fn open(config_path: Option<&Path>, project: Option<&str>) -> Result<Self> {
        let config = Config::load(config_path)?;
        Self::from_config(&config, project)
    }

    fn from_config(config: &Config, project: Option<&str>) -> Result<Self> {
        config.ensure_valid()?;
        let jira = config.jira()?;
        let project_key = config.project_key(project)?;

        let client = JiraClient::new(JiraClientOptions {
            base_url: jira.base_url.clone(),
            email: jira.email.clone(),
            token: jira.token.clone(),
        })?;

        tracing::debug!("Using {} project {}", jira.base_url, project_key);
        Ok(Self {
            client,
            options: SyncOptions::new(project_key, config.batch_size),
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        project,
        config,
        verbose,
        command,
    } = cli;
    let config = config.as_deref();
    let project = project.as_deref();

    match command {
        Command::Init { force } => init(force),
        Command::Export { file } => export(config, project, &file, verbose).await,
        Command::Import {
            output,
            no_report,
            report_dir,
        } => {
            let report_dir = (!no_report).then_some(report_dir);
            import(config, project, &output, report_dir, verbose).await
        }
        Command::Diff => {
            println!("diff not implemented yet");
            Ok(())
        }
    }
}

fn init(force: bool) -> Result<()> {
    let path = Config::local_path();
    Config::write_template(&path, force)?;
    println!("Wrote {}", path.display());
    println!("Fill in service.email and service.token, or set JIRA_EMAIL and JIRA_TOKEN.");
    Ok(())
}

async fn export(config: Option<&Path>, project: Option<&str>, file: &Path, verbose: bool) -> Result<()> {
    let tasks = read_task_file(file)?;
    let session = Session::open(config, project)?;

    let mut sink = BarSink::new(should_show_progress() && !verbose, verbose);
    let summary = export_tasks(&session.client, &tasks.tasks, &session.options, &mut sink).await;

    println!("{}", export_line(&summary));
    Ok(())
}

async fn import(
    config: Option<&Path>,
    project: Option<&str>,
    output: &Path,
    report_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let session = Session::open(config, project)?;

    let mut sink = BarSink::new(should_show_progress() && !verbose, verbose);
    let result = import_tasks(&session.client, &session.options, &mut sink).await?;

    let file = TaskFile {
        tasks: result.tasks,
    };
    write_task_file(output, &file)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Import complete: {} tasks and {} subtasks",
        file.tasks.len(),
        result.subtask_count
    );
    if verbose {
        println!("Wrote {}", output.display());
    }
    if result.skipped > 0 {
        println!("Skipped {} issues with malformed keys", result.skipped);
    }

    if let Some(dir) = report_dir {
        let path = write_import_report(
            &dir,
            &file.tasks,
            &result.keys,
            result.subtask_count,
            &session.options.project_key,
            chrono::Utc::now(),
        )?;
        println!("Report: {}", path.display());
    }

    Ok(())
}

fn export_line(summary: &ExportSummary) -> String {
    let mut line = format!(
        "Export complete: {} created, {} updated",
        summary.created, summary.updated
    );
    if summary.errors > 0 {
        line.push_str(&format!(", {} errors", summary.errors));
    }
    line
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use taskbridge_core::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn test_export_line() {
        let clean = ExportSummary {
            created: 2,
            updated: 1,
            errors: 0,
        };
        assert_eq!(export_line(&clean), "Export complete: 2 created, 1 updated");

        let failed = ExportSummary { errors: 3, ..clean };
        assert_eq!(export_line(&failed), "Export complete: 2 created, 1 updated, 3 errors");
    }

    #[test]
    fn test_session_rejects_missing_config() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = Session::open(Some(&missing), None).err().unwrap();
        assert!(err.to_string().contains("absent.toml"), "{err}");
    }

    fn config_without_credentials() -> Config {
        let mut config = Config::from_toml_str(
            "[service]\ntype = \"jira\"\nbase_url = \"https://acme.atlassian.net\"\nproject_key = \"ACME\"\n",
        )
        .unwrap();
        config.apply_env(|_| None);
        config
    }

    #[test]
    fn test_session_rejects_unusable_config() {
        let err = Session::from_config(&config_without_credentials(), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("email"), "{err}");
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_session_from_complete_config() {
        let mut config = config_without_credentials();
        config.apply_env(|name| match name {
            "JIRA_EMAIL" => Some("dev@acme.test".to_string()),
            "JIRA_TOKEN" => Some("secret".to_string()),
            _ => None,
        });

        let session = Session::from_config(&config, None).unwrap();
        assert_eq!(session.options.project_key, "ACME");

        let session = Session::from_config(&config, Some("CLI")).unwrap();
        assert_eq!(session.options.project_key, "CLI");
    }
}
