//! Residents and their shift reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;
use crate::validation::{require, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    Day,
    Evening,
    Night,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub room_number: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// A narrative entry from `shift_reports`. Reports are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub id: String,
    pub resident_id: String,
    pub author_id: UserId,
    pub shift: Shift,
    #[serde(alias = "report")]
    pub report_text: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResident {
    pub name: String,
    pub room_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: String,
}

impl NewResident {
    pub fn validate(&self) -> Result<(), ValidationError> {
        const MESSAGE: &str = "Name, Room Number and Date of Birth are required.";
        require(&self.name, MESSAGE)?;
        require(&self.room_number, MESSAGE)?;
        match self.date_of_birth {
            Some(_) => Ok(()),
            None => Err(ValidationError::Required(MESSAGE)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShiftReport {
    pub resident_id: String,
    pub author_id: UserId,
    pub shift: Shift,
    pub date: DateTime<Utc>,
    pub report_text: String,
}

impl NewShiftReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.report_text, "Report text is required.")?;
        require(&self.resident_id, "Report text is required.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resident_requires_birth_date() {
        let mut input = NewResident {
            name: "Ada Moss".into(),
            room_number: "112".into(),
            date_of_birth: None,
            notes: String::new(),
        };
        assert!(input.validate().is_err());
        input.date_of_birth = NaiveDate::from_ymd_opt(1938, 2, 14);
        assert!(input.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&input).unwrap()["dateOfBirth"],
            json!("1938-02-14")
        );
    }

    #[test]
    fn report_from_document() {
        let report: ShiftReport = serde_json::from_value(json!({
            "id": "r1",
            "residentId": "res1",
            "authorId": "nurse1",
            "shift": "Night",
            "reportText": "Slept through.",
            "date": "2024-04-02T06:00:00Z",
        }))
        .unwrap();
        assert_eq!(report.shift, Shift::Night);
        assert_eq!(report.report_text, "Slept through.");
    }

    #[test]
    fn empty_report_rejected() {
        let input = NewShiftReport {
            resident_id: "res1".into(),
            author_id: "nurse1".into(),
            shift: Shift::Day,
            date: Utc::now(),
            report_text: "   ".into(),
        };
        assert_eq!(input.validate().unwrap_err().to_string(), "Report text is required.");
    }
}
