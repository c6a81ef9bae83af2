//! The event carried on the channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Kind of request that was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    List,
    Get,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::List => "list",
            Self::Get => "get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read or write denied by the store's access rules.
///
/// `request_resource_data` is the payload of a denied write, so the
/// diagnostic can show exactly what was attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct PermissionError {
    pub path: String,
    pub operation: Operation,
    pub request_resource_data: Option<Value>,
}

impl PermissionError {
    pub fn new(path: impl Into<String>, operation: Operation) -> Self {
        Self {
            path: path.into(),
            operation,
            request_resource_data: None,
        }
    }

    pub fn with_payload(mut self, data: Value) -> Self {
        self.request_resource_data = Some(data);
        self
    }

    /// Structured description of the denied request.
    pub fn context(&self) -> Value {
        let mut context = json!({
            "method": self.operation.as_str(),
            "path": self.path,
        });
        if let Some(data) = &self.request_resource_data {
            context["request"] = json!({ "resource": { "data": data } });
        }
        context
    }

}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let context =
            serde_json::to_string_pretty(&self.context()).unwrap_or_else(|_| self.path.clone());
        write!(
            f,
            "Missing or insufficient permissions: the following request was denied by the store's security rules:\n{context}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_without_payload() {
        let err = PermissionError::new("/daily_tasks", Operation::List);
        assert_eq!(err.context(), json!({"method": "list", "path": "/daily_tasks"}));
        assert!(err.to_string().starts_with("Missing or insufficient permissions"));
    }

    #[test]
    fn context_with_payload() {
        let err = PermissionError::new("/inventory", Operation::Create)
            .with_payload(json!({"name": "Mop", "quantity": 2}));
        assert_eq!(
            err.context()["request"]["resource"]["data"],
            json!({"name": "Mop", "quantity": 2})
        );
        assert!(err.to_string().contains("\"quantity\": 2"));
    }

    #[test]
    fn operation_names() {
        assert_eq!(serde_json::to_value(Operation::Update).unwrap(), json!("update"));
        assert_eq!(Operation::Get.to_string(), "get");
    }
}
