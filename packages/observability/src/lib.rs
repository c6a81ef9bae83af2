//! # Observability
//!
//! One place that installs the `tracing` subscriber for HighPoint binaries.
//! Library crates only emit events; the binary calls [`init_with_config`]
//! once, early in `main`.
//!
//! Output:
//!
//! - stderr, compact and human-readable, when `also_stderr` is set
//! - with the `dev` feature (default), a JSONL file of [`LogEntry`] lines,
//!   `~/.highpoint/logs/dev.jsonl` unless `log_path` says otherwise
//!
//! ```text
//! tail -f ~/.highpoint/logs/dev.jsonl | jq 'select(.level == "ERROR")'
//! ```
//!
//! `RUST_LOG` overrides `default_level` for every layer.

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

use std::path::PathBuf;

pub use json_layer::LogEntry;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every JSONL line as `service`.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"info,live_bindings=debug"`.
    pub default_level: String,
    pub log_path: Option<PathBuf>,
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "highpoint".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Install the global subscriber. A second call leaves the first one in
/// place.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    dev::init_dev_subscriber(&config);

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_logs_info_without_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "highpoint");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }
}
