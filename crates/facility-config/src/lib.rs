//! Configuration, paths, errors and logging for HighPoint HouseKeep.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, ConfigStatus, LlmSettings, StoreSettings, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL,
    DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_MS, STORE_ENV_VARS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
