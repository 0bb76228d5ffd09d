use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Move tasks between a Taskmaster task file and Jira.
#[derive(Debug, Parser)]
#[command(name = "taskbridge", version, about = "Sync Taskmaster tasks with Jira")]
pub struct Cli {
    /// Jira project key; overrides the configured one
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Config file to use instead of discovery
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-item output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a default .taskbridge.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Push tasks from a task file to Jira
    Export {
        /// Task file to read
        file: PathBuf,
    },

    /// Pull Jira issues into a task file
    Import {
        /// Where to write the task file
        #[arg(short, long, default_value = "jira_stories.json")]
        output: PathBuf,

        /// Skip the Markdown import report
        #[arg(long)]
        no_report: bool,

        /// Directory for the import report
        #[arg(long, default_value = taskbridge_sync::report::DEFAULT_REPORT_DIR)]
        report_dir: PathBuf,
    },

    /// Compare local tasks with Jira
    Diff,
}
