//! Draft audit-compliance reports.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::{ChatMessage, CompletionProvider};
use crate::error::AssistantResult;

const REPORT_PROMPT: &str = include_str!("prompts/audit_report.txt");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub report: String,
}

pub struct AuditReportFlow {
    provider: Arc<dyn CompletionProvider>,
}

impl AuditReportFlow {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub fn render(start: NaiveDate, end: NaiveDate) -> String {
        REPORT_PROMPT
            .replace("{start}", &start.format("%Y-%m-%d").to_string())
            .replace("{end}", &end.format("%Y-%m-%d").to_string())
    }

    pub async fn draft(&self, start: NaiveDate, end: NaiveDate) -> AssistantResult<AuditReport> {
        tracing::info!(%start, %end, "drafting audit report");
        let messages = [ChatMessage::user(Self::render(start, end))];
        let report = self.provider.complete(&messages).await?;
        Ok(AuditReport { report })
    }
}

/// Outcome shown under the report form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFormState {
    pub message: String,
    pub report: Option<String>,
}

impl ReportFormState {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            report: None,
        }
    }
}

/// Validate the picked range and draft a report for it.
pub async fn generate_report_action(
    flow: &AuditReportFlow,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ReportFormState {
    let Some(from) = from else {
        return ReportFormState::message("Invalid form data. Please select a valid date range.");
    };
    let Some(to) = to else {
        return ReportFormState::message("Please select an end date for the range.");
    };
    if to < from {
        return ReportFormState::message("Invalid form data. Please select a valid date range.");
    }

    match flow.draft(from, to).await {
        Ok(AuditReport { report }) if !report.is_empty() => ReportFormState {
            message: "Report generated successfully.".to_string(),
            report: Some(report),
        },
        Ok(_) => ReportFormState::message("Failed to generate report. No content was returned."),
        Err(e) => {
            tracing::error!(error = %e, "audit report failed");
            ReportFormState::message(format!("Error generating report: {e}"))
        }
    }
}
