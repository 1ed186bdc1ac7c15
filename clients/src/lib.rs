//! Shared setup for the NFSe client binaries.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::Path;

use anyhow::{Context, Result};
use nfse_schema::Settings;
use tracing_subscriber::EnvFilter;

/// Installs the `fmt` subscriber. `RUST_LOG` overrides the default level,
/// which is `info`, or `warn` when `quiet` is set.
pub fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_target(false)
        .init();
}

/// Loads settings from `base_path`, then applies an optional guides
/// directory override from the command line.
///
/// # Errors
///
/// Returns an error if the settings file exists but is invalid.
pub fn load_settings(base_path: &Path, guides_dir: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::load(base_path)
        .with_context(|| format!("Failed to load settings from {}", base_path.display()))?;
    if let Some(dir) = guides_dir {
        settings.guides_dir = dir.to_path_buf();
    }
    Ok(settings)
}
