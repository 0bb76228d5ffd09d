pub mod config;
pub mod error;

pub use config::{
    Config, JiraServiceConfig, LinearServiceConfig, ServiceConfig, ValidationResult,
    CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE,
};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize logging for the bridge.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` in verbose mode.
/// Safe to call more than once.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();

    if initialized {
        tracing::debug!("taskbridge logging initialized");
    }
    Ok(())
}
