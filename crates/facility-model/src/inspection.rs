//! Quality inspections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;
use crate::validation::{require, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InspectionStatus {
    Pass,
    Fail,
    #[serde(rename = "Corrective Action")]
    CorrectiveAction,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::CorrectiveAction => "Corrective Action",
        }
    }
}

/// An entry from `inspections`. Older documents key the location as `roomId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: String,
    #[serde(alias = "roomId")]
    pub location: String,
    pub inspector_id: UserId,
    pub date: DateTime<Utc>,
    pub status: InspectionStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInspection {
    pub location: String,
    pub status: InspectionStatus,
    pub notes: String,
    pub inspector_id: UserId,
    pub date: DateTime<Utc>,
}

impl NewInspection {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.location, "Location is required.")
    }
}
