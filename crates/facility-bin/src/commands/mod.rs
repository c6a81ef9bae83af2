//! Subcommand handlers.
//!
//! Store-backed commands connect through [`AppContext`](crate::context::AppContext)
//! and are gated on the same routes the dashboard uses.

mod assistant;
mod inventory;
mod session;
mod tasks;

pub use assistant::{audit, chat};
pub use inventory::{inventory, InventoryAction};
pub use session::{seed, watch, whoami};
pub use tasks::{tasks, TaskAction};

use facility_config::{Config, CoreResult, Paths};

/// Print connection status and what is missing.
pub fn check(config: &Config) {
    let status = config.store_status();
    println!("{}", status.setup_instructions());

    if config.llm.api_key.is_some() {
        println!("Assistant: configured ({})", config.llm.model);
    } else {
        println!("Assistant: set HIGHPOINT_LLM_API_KEY to enable chat and audit reports");
    }
}

/// Persist the effective settings, environment overrides included.
pub fn init(config: &Config, paths: &Paths) -> CoreResult<()> {
    config.save(paths)?;
    println!("Wrote {}", paths.config_file().display());
    Ok(())
}
