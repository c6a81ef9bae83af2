//! Configuration management.
//!
//! Connection coordinates for the hosted document store come from six named
//! environment variables. Missing coordinates never abort startup: callers get
//! a [`ConfigStatus::NotConfigured`] they can render as a setup screen.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default OpenAI-compatible completion endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default completion model.
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

/// Default interval between remote listener polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Environment variables supplying the store connection settings, in the
/// order they are reported when missing.
pub const STORE_ENV_VARS: [&str; 6] = [
    "FIREBASE_API_KEY",
    "FIREBASE_AUTH_DOMAIN",
    "FIREBASE_PROJECT_ID",
    "FIREBASE_STORAGE_BUCKET",
    "FIREBASE_MESSAGING_SENDER_ID",
    "FIREBASE_APP_ID",
];

/// Connection coordinates for the hosted project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

impl StoreSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> ConfigStatus {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigStatus {
        let mut settings = Self::default();
        settings.apply_lookup(lookup);
        settings.status()
    }

    /// Overwrite fields with every non-empty variable the lookup yields.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for name in STORE_ENV_VARS {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *self.field_mut(name) = value;
            }
        }
    }

    /// Names of the variables whose value is absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        STORE_ENV_VARS
            .into_iter()
            .filter(|name| self.field(name).trim().is_empty())
            .collect()
    }

    /// Classify these settings.
    pub fn status(&self) -> ConfigStatus {
        let missing = self.missing();
        if missing.is_empty() {
            ConfigStatus::Configured(self.clone())
        } else {
            ConfigStatus::NotConfigured { missing }
        }
    }

    /// Firestore REST root for this project's default database.
    pub fn documents_url(&self) -> CoreResult<Url> {
        let raw = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        );
        Url::parse(&raw).map_err(CoreError::from)
    }

    fn field(&self, name: &str) -> &str {
        match name {
            "FIREBASE_API_KEY" => &self.api_key,
            "FIREBASE_AUTH_DOMAIN" => &self.auth_domain,
            "FIREBASE_PROJECT_ID" => &self.project_id,
            "FIREBASE_STORAGE_BUCKET" => &self.storage_bucket,
            "FIREBASE_MESSAGING_SENDER_ID" => &self.messaging_sender_id,
            _ => &self.app_id,
        }
    }

    fn field_mut(&mut self, name: &str) -> &mut String {
        match name {
            "FIREBASE_API_KEY" => &mut self.api_key,
            "FIREBASE_AUTH_DOMAIN" => &mut self.auth_domain,
            "FIREBASE_PROJECT_ID" => &mut self.project_id,
            "FIREBASE_STORAGE_BUCKET" => &mut self.storage_bucket,
            "FIREBASE_MESSAGING_SENDER_ID" => &mut self.messaging_sender_id,
            _ => &mut self.app_id,
        }
    }
}

/// Outcome of checking the store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigStatus {
    Configured(StoreSettings),
    NotConfigured { missing: Vec<&'static str> },
}

impl ConfigStatus {
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// The settings, or a [`CoreError::NotConfigured`] naming what is missing.
    pub fn settings(&self) -> CoreResult<&StoreSettings> {
        match self {
            Self::Configured(settings) => Ok(settings),
            Self::NotConfigured { missing } => Err(CoreError::NotConfigured {
                missing: missing.clone(),
            }),
        }
    }

    /// Text for the blocking setup screen shown instead of the dashboard.
    pub fn setup_instructions(&self) -> String {
        let missing = match self {
            Self::Configured(_) => return "Store connection is configured.".to_string(),
            Self::NotConfigured { missing } => missing,
        };

        let mut text = String::from("HighPoint HouseKeep is not configured.\n\n");
        text.push_str("The following environment variables are missing or empty:\n");
        for name in missing {
            text.push_str(&format!("  - {name}\n"));
        }
        text.push_str("\nExport every variable below with your project's values, then restart:\n\n");
        for name in STORE_ENV_VARS {
            text.push_str(&format!("  {name}=your_{}\n", name.trim_start_matches("FIREBASE_").to_lowercase()));
        }
        text.push_str("\nThe values are listed in the project settings of the hosting console.\n");
        text
    }
}

/// Settings for the completion endpoint used by the assistant flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Hosted project coordinates.
    #[serde(default)]
    pub store: StoreSettings,
    /// Completion endpoint for the assistant flows.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Interval between polls of remote live listeners.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            store: StoreSettings::default(),
            llm: LlmSettings::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_lookup(|name| std::env::var(name).ok());
        config
    }

    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let from_file = config_path.exists();
        let mut config = if from_file {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_lookup(|name| std::env::var(name).ok());
        tracing::debug!(path = %config_path.display(), from_file, "config loaded");
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        if config.poll_interval_ms == 0 {
            tracing::warn!(
                path = %path.display(),
                default = DEFAULT_POLL_INTERVAL_MS,
                "poll_interval_ms must be positive, using default"
            );
            config.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the environment in production).
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("HIGHPOINT_LOG_LEVEL") {
            self.log_level = level;
        }
        self.store.apply_lookup(&lookup);
        if let Some(key) = lookup("HIGHPOINT_LLM_API_KEY").filter(|v| !v.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("HIGHPOINT_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("HIGHPOINT_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(raw) = lookup("HIGHPOINT_POLL_INTERVAL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.poll_interval_ms = ms,
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring HIGHPOINT_POLL_INTERVAL_MS, expected a positive number of milliseconds"
                ),
            }
        }
    }

    /// Status of the store connection settings.
    pub fn store_status(&self) -> ConfigStatus {
        self.store.status()
    }
}
