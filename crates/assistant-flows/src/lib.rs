//! # Assistant flows
//!
//! Two stateless prompt templates over a text-completion endpoint:
//!
//! - [`ChatFlow`]: "Goldie", the in-app assistant, answering with the
//!   conversation so far as context
//! - [`AuditReportFlow`]: a draft compliance report for a date range
//!
//! [`chat_action`] and [`generate_report_action`] wrap the flows with the
//! form handling of the dashboard, turning every failure into a message.

mod audit;
mod chat;
mod client;
mod error;

pub use audit::{generate_report_action, AuditReport, AuditReportFlow, ReportFormState};
pub use chat::{chat_action, parse_history, ChatFlow, ChatOutput, ChatState, ChatTurn, Speaker};
pub use client::{
    ChatMessage, CompletionProvider, OpenAiCompatibleClient, StaticCompletionProvider,
};
pub use error::{AssistantError, AssistantResult};
