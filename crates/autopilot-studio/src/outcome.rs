use std::fmt::Display;

use serde::Serialize;

/// Uniform `{ success, data, error }` shape returned at collaborator boundaries, so callers
/// branch on a flag instead of handling every provider's error type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(message) if !self.success => Err(message),
            _ => Ok(self.data),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ActionResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}
