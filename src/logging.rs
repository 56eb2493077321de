//! File-backed `tracing` subscriber for host applications.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{MailglossError, Result};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "mailgloss=info";

/// Install a global subscriber appending plain-text events to `log_file`.
///
/// The parent directory must exist. Fails if a global subscriber is already set.
pub fn init(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| MailglossError::Io {
            path: log_file.to_path_buf(),
            source: e,
        })?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| MailglossError::LoggingInit {
            reason: e.to_string(),
        })?;

    tracing::info!(path = %log_file.display(), "logging initialized");
    Ok(())
}
