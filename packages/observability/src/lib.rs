//! # Observability
//!
//! One place that decides where the workspace's `tracing` output goes.
//!
//! Crates never install a subscriber themselves. They log through the plain
//! `tracing` macros, and the binary calls [`init_with_config`] once at
//! startup.
//!
//! ## Dev Mode
//!
//! With the `dev` feature (on by default) every event is written as one JSON
//! object per line to a central file, `~/.notes/logs/dev.jsonl` unless
//! [`LogConfig::log_path`] says otherwise:
//!
//! - `tail -f ~/.notes/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.notes/logs/dev.jsonl` for interactive exploration
//!
//! Without it, a compact human-readable subscriber writes to stderr.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "notes-cli".into(),
//!         default_level: "debug".into(),
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

#[cfg(feature = "dev")]
mod dev;
#[cfg(feature = "dev")]
mod json_layer;

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSONL line.
    pub service_name: String,

    /// Default filter (e.g. "debug", "info", "notes_facade=trace").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Log file for dev mode. Defaults to [`default_log_path`].
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr in dev mode.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// `~/.notes/logs/dev.jsonl`, or `None` when there is no home directory.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".notes").join("logs").join("dev.jsonl"))
}

/// Installs the global subscriber.
///
/// Only the first call in a process has an effect. If the dev log file
/// cannot be opened, logging falls back to stderr.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        match dev::init_dev_subscriber(&config) {
            Ok(()) => return,
            Err(err) => eprintln!("observability: dev log file unavailable ({err}), using stderr"),
        }
    }

    init_stderr_subscriber(&config);
}

fn init_stderr_subscriber(config: &LogConfig) {
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.default_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .finish()
        .try_init();
}

/// `RUST_LOG` if it parses, otherwise `default_level`.
fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

pub use tracing::{debug, error, info, trace, warn, Level};
