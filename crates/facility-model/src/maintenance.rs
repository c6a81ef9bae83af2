//! Maintenance work orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;
use crate::validation::{require, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceIssueType {
    Plumbing,
    Electrical,
    #[serde(rename = "HVAC")]
    Hvac,
    Painting,
    #[serde(rename = "General Repair")]
    GeneralRepair,
}

impl MaintenanceIssueType {
    pub const ALL: [MaintenanceIssueType; 5] = [
        Self::Plumbing,
        Self::Electrical,
        Self::Hvac,
        Self::Painting,
        Self::GeneralRepair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
            Self::Hvac => "HVAC",
            Self::Painting => "Painting",
            Self::GeneralRepair => "General Repair",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MaintenancePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
        }
    }
}

/// A ticket from `maintenance_work_orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWorkOrder {
    pub id: String,
    pub location: String,
    pub issue_type: MaintenanceIssueType,
    pub priority: MaintenancePriority,
    pub description: String,
    pub status: MaintenanceStatus,
    pub created_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input of the work-order form. Tickets open as `Open`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    pub location: String,
    pub issue_type: MaintenanceIssueType,
    pub priority: MaintenancePriority,
    pub description: String,
    pub status: MaintenanceStatus,
    pub created_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

impl NewWorkOrder {
    pub fn new(
        location: impl Into<String>,
        description: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            location: location.into(),
            issue_type: MaintenanceIssueType::GeneralRepair,
            priority: MaintenancePriority::Medium,
            description: description.into(),
            status: MaintenanceStatus::Open,
            created_by,
            assigned_to: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        const MESSAGE: &str = "Location and Description are required.";
        require(&self.location, MESSAGE)?;
        require(&self.description, MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_names() {
        assert_eq!(json!(MaintenanceIssueType::Hvac), json!("HVAC"));
        assert_eq!(json!(MaintenanceIssueType::GeneralRepair), json!("General Repair"));
        assert_eq!(json!(MaintenanceStatus::OnHold), json!("On Hold"));
        for kind in MaintenanceIssueType::ALL {
            assert_eq!(json!(kind), json!(kind.as_str()));
        }
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(MaintenancePriority::Urgent > MaintenancePriority::High);
        assert!(MaintenancePriority::Low < MaintenancePriority::Medium);
    }

    #[test]
    fn unassigned_order_omits_field() {
        let order = NewWorkOrder::new("Room 104", "Leaking faucet", "sup".into());
        assert!(order.validate().is_ok());
        let value = serde_json::to_value(&order).unwrap();
        assert!(value.get("assignedTo").is_none());
        assert_eq!(value["status"], json!("Open"));
        assert_eq!(value["issueType"], json!("General Repair"));
    }

    #[test]
    fn blank_description_rejected() {
        let order = NewWorkOrder::new("Room 104", "", "sup".into());
        assert_eq!(
            order.validate().unwrap_err().to_string(),
            "Location and Description are required."
        );
    }
}
