//! Daily housekeeping tasks and deep-cleaning rotations.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;
use crate::validation::{require, ValidationError};

/// Status of a daily task.
///
/// Staff drive `Pending -> InProgress -> Completed`, and may decline from
/// either open state. `Overdue` is set from outside the normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Overdue,
    Declined,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Overdue => "Overdue",
            Self::Declined => "Declined",
        }
    }

    /// Still on someone's list.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Pending | Self::InProgress, Self::Declined)
        )
    }

    /// Validate a staff-driven status change.
    pub fn transition(self, next: TaskStatus) -> Result<TaskStatus, ValidationError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ValidationError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    /// External transition. Terminal tasks stay where they are.
    pub fn mark_overdue(self) -> TaskStatus {
        if self.is_open() {
            Self::Overdue
        } else {
            self
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One room's task for one day, from `daily_tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: String,
    pub room_number: String,
    pub room_type: String,
    pub assigned_to: UserId,
    pub status: TaskStatus,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input of the add-task form. New tasks always start `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDailyTask {
    pub room_number: String,
    pub room_type: String,
    pub assigned_to: UserId,
    pub status: TaskStatus,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewDailyTask {
    pub const DEFAULT_ROOM_TYPE: &'static str = "Daily Clean";

    pub fn new(room_number: impl Into<String>, assigned_to: UserId, date: NaiveDate) -> Self {
        Self {
            room_number: room_number.into(),
            room_type: Self::DEFAULT_ROOM_TYPE.to_string(),
            assigned_to,
            status: TaskStatus::Pending,
            date,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        const MESSAGE: &str = "Room Number and Assigned To are required.";
        require(&self.room_number, MESSAGE)?;
        require(self.assigned_to.as_str(), MESSAGE)
    }
}

/// Status of a deep-cleaning rotation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeepCleanStatus {
    Scheduled,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl DeepCleanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for DeepCleanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zone scheduled for deep cleaning, from `deep_clean_tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepCleanTask {
    pub id: String,
    pub zone: String,
    pub scheduled_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    pub assigned_to: UserId,
    pub status: DeepCleanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allowed_transitions() {
        use TaskStatus::*;
        assert_eq!(Pending.transition(InProgress), Ok(InProgress));
        assert_eq!(InProgress.transition(Completed), Ok(Completed));
        assert_eq!(Pending.transition(Declined), Ok(Declined));
        assert_eq!(InProgress.transition(Declined), Ok(Declined));
    }

    #[test]
    fn rejected_transitions() {
        use TaskStatus::*;
        for (from, to) in [
            (Pending, Completed),
            (Completed, Pending),
            (Declined, InProgress),
            (Overdue, Completed),
            (InProgress, Pending),
            (Pending, Overdue),
        ] {
            let err = from.transition(to).unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidTransition {
                    from: from.to_string(),
                    to: to.to_string()
                }
            );
        }
    }

    #[test]
    fn overdue_only_from_open_states() {
        assert_eq!(TaskStatus::Pending.mark_overdue(), TaskStatus::Overdue);
        assert_eq!(TaskStatus::InProgress.mark_overdue(), TaskStatus::Overdue);
        assert_eq!(TaskStatus::Completed.mark_overdue(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Declined.mark_overdue(), TaskStatus::Declined);
    }

    #[test]
    fn stored_status_names() {
        assert_eq!(json!(TaskStatus::InProgress), json!("In Progress"));
        let status: TaskStatus = serde_json::from_value(json!("In Progress")).unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert_eq!(json!(DeepCleanStatus::InProgress), json!("In Progress"));
    }

    #[test]
    fn task_from_document() {
        let task: DailyTask = serde_json::from_value(json!({
            "id": "t1",
            "roomNumber": "B2",
            "roomType": "Deep Clean",
            "assignedTo": "hk2",
            "status": "Overdue",
            "date": "2024-03-09",
            "createdAt": "2024-03-09T07:00:00Z",
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Overdue);
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(task.notes.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn new_task_defaults_and_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let task = NewDailyTask::new("C1", UserId::from("hk1"), date);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.room_type, "Daily Clean");
        assert!(task.validate().is_ok());

        let blank = NewDailyTask::new(" ", UserId::from("hk1"), date);
        assert_eq!(
            blank.validate().unwrap_err().to_string(),
            "Room Number and Assigned To are required."
        );
        let unassigned = NewDailyTask::new("C1", UserId::from(""), date);
        assert!(unassigned.validate().is_err());
    }

    #[test]
    fn new_task_payload_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let value = serde_json::to_value(NewDailyTask::new("A1", "hk1".into(), date)).unwrap();
        assert_eq!(
            value,
            json!({
                "roomNumber": "A1",
                "roomType": "Daily Clean",
                "assignedTo": "hk1",
                "status": "Pending",
                "date": "2024-03-10",
            })
        );
    }
}
