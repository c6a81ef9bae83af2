//! Assistant chat and audit report drafting.

use std::path::Path;
use std::sync::Arc;

use assistant_flows::{
    chat_action, generate_report_action, parse_history, AuditReportFlow, ChatFlow, ChatState,
    OpenAiCompatibleClient, Speaker,
};
use chrono::NaiveDate;
use facility_config::Config;

use crate::context::CommandResult;

fn client(config: &Config) -> CommandResult<Arc<OpenAiCompatibleClient>> {
    Ok(Arc::new(OpenAiCompatibleClient::from_settings(&config.llm)?))
}

/// Continue the conversation stored at `history`, creating it on first use.
pub async fn chat(config: &Config, message: &str, history: &Path) -> CommandResult {
    let messages = if history.exists() {
        parse_history(&std::fs::read_to_string(history)?)?
    } else {
        Vec::new()
    };

    let flow = ChatFlow::new(client(config)?);
    let previous = ChatState {
        messages,
        error: None,
    };
    let state = chat_action(&flow, previous, message).await;

    // The user's turn is kept even when the assistant failed.
    if let Some(dir) = history.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(history, serde_json::to_string_pretty(&state.messages)?)?;

    if let Some(error) = state.error {
        return Err(error.into());
    }
    if let Some(reply) = state
        .messages
        .iter()
        .rev()
        .find(|turn| turn.role == Speaker::Assistant)
    {
        println!("{}", reply.content);
    }
    Ok(())
}

pub async fn audit(
    config: &Config,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> CommandResult {
    let flow = AuditReportFlow::new(client(config)?);
    let state = generate_report_action(&flow, from, to).await;

    match state.report {
        Some(report) => {
            eprintln!("{}", state.message);
            println!("{report}");
            Ok(())
        }
        None => Err(state.message.into()),
    }
}
