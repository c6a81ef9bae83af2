//! Staff profiles and roles.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{require, validate_email, ValidationError};

/// Identity-provider uid, also the id of the profile document in `users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role stored on a profile. Drives every client-side authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Supervisor,
    Housekeeper,
    Director,
    Administrator,
    Nurse,
    Maintenance,
}

impl UserRole {
    pub const ALL: [UserRole; 7] = [
        Self::Admin,
        Self::Supervisor,
        Self::Housekeeper,
        Self::Director,
        Self::Administrator,
        Self::Nurse,
        Self::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Supervisor => "Supervisor",
            Self::Housekeeper => "Housekeeper",
            Self::Director => "Director",
            Self::Administrator => "Administrator",
            Self::Nurse => "Nurse",
            Self::Maintenance => "Maintenance",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// Create tasks, manage inventory and log inspections.
    pub fn can_manage_operations(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Supervisor | Self::Director | Self::Administrator
        )
    }

    /// Add residents. Shift reports are open to everyone with nursing access.
    pub fn can_manage_nursing(&self) -> bool {
        matches!(self, Self::Director | Self::Administrator)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff profile from the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Initials shown in place of a missing avatar.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Input of the add-user form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar_url: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "Name and Email are required.")?;
        require(&self.email, "Name and Email are required.")?;
        validate_email(&self.email)
    }
}
