use std::fmt;

use shared::{
    domain::{FieldEditError, TierId},
    error::ErrorBody,
};
use thiserror::Error;

pub const UNKNOWN_ERROR: &str = "Unknown Error";
pub const NULL_RESPONSE_MESSAGE: &str =
    "The return from the server was null. Please contact your administrator";

/// Which round trip produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Load,
    Insert,
    Update,
    Delete,
}

impl SyncKind {
    pub fn is_write(self) -> bool {
        !matches!(self, SyncKind::Load)
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncKind::Load => "load",
            SyncKind::Insert => "insert",
            SyncKind::Update => "update",
            SyncKind::Delete => "delete",
        })
    }
}

/// What a failed backend call handed back: the HTTP status when there was
/// one, and the error body.
#[derive(Debug, Clone, PartialEq)]
pub struct FailurePayload {
    pub status: Option<u16>,
    pub body: ErrorBody,
}

impl FailurePayload {
    pub fn new(status: Option<u16>, body: ErrorBody) -> Self {
        Self { status, body }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(None, ErrorBody::message(message))
    }

    /// Human readable text: list bodies join each item's message with
    /// ", ", object bodies use their string `message`, anything else is
    /// "Unknown Error". A bare string in a list is its own message.
    pub fn message(&self) -> String {
        match &self.body {
            ErrorBody::List(items) => items
                .iter()
                .map(|item| message_text(item.message.as_ref()))
                .collect::<Vec<_>>()
                .join(", "),
            ErrorBody::Entries(entries) => entries
                .iter()
                .map(|entry| match entry {
                    serde_json::Value::String(text) => text.clone(),
                    other => message_text(other.get("message")),
                })
                .collect::<Vec<_>>()
                .join(", "),
            ErrorBody::Single(item) => match &item.message {
                Some(serde_json::Value::String(text)) => text.clone(),
                _ => UNKNOWN_ERROR.to_string(),
            },
            ErrorBody::Other(_) => UNKNOWN_ERROR.to_string(),
        }
    }
}

fn message_text(message: Option<&serde_json::Value>) -> String {
    match message {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl fmt::Display for FailurePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message()),
            None => f.write_str(&self.message()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("backend rejected the request: {0}")]
    Validation(FailurePayload),
    #[error("backend request failed: {0}")]
    Backend(FailurePayload),
}

impl GatewayError {
    pub fn payload(&self) -> &FailurePayload {
        match self {
            GatewayError::Validation(payload) | GatewayError::Backend(payload) => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("{operation} succeeded but the backend returned no records")]
    NullResponse { operation: SyncKind },
    #[error("{operation} failed: {payload}")]
    Backend {
        operation: SyncKind,
        payload: FailurePayload,
    },
    #[error("{operation} rejected by the backend: {payload}")]
    Rejected {
        operation: SyncKind,
        payload: FailurePayload,
    },
    #[error("one or more inputs are invalid")]
    InvalidInput,
    #[error("{}", not_found_message(.tier_id))]
    NotFound { tier_id: Option<TierId> },
    #[error(transparent)]
    Field(#[from] FieldEditError),
    #[error("another request is still in flight")]
    Busy,
}

fn not_found_message(tier_id: &Option<TierId>) -> String {
    match tier_id {
        Some(tier_id) => format!("no tier with id {tier_id} in the working set"),
        None => "no pending tier to edit".to_string(),
    }
}

impl EditorError {
    pub fn from_gateway(operation: SyncKind, err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(payload) => EditorError::Rejected { operation, payload },
            GatewayError::Backend(payload) => EditorError::Backend { operation, payload },
        }
    }

    /// Payload for the error notification of a failed round trip. Local
    /// errors have none; they are reported where they happen.
    pub fn failure_payload(&self) -> Option<FailurePayload> {
        match self {
            EditorError::NullResponse { .. } => {
                Some(FailurePayload::from_message(NULL_RESPONSE_MESSAGE))
            }
            EditorError::Backend { payload, .. } | EditorError::Rejected { payload, .. } => {
                Some(payload.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorItem;

    fn item(message: serde_json::Value) -> ErrorItem {
        ErrorItem {
            message: Some(message),
        }
    }

    #[test]
    fn list_body_joins_messages() {
        let payload = FailurePayload::new(
            Some(400),
            ErrorBody::List(vec![
                item(serde_json::json!("name is required")),
                item(serde_json::json!("label is required")),
            ]),
        );
        assert_eq!(payload.message(), "name is required, label is required");
    }

    #[test]
    fn list_of_plain_values_joins_what_it_can() {
        let body: ErrorBody =
            serde_json::from_str(r#"["boom", {"message": "bust"}, 7]"#).expect("entries");
        let payload = FailurePayload::new(Some(500), body);
        assert_eq!(payload.message(), "boom, bust, ");
    }

    #[test]
    fn object_body_without_string_message_is_unknown() {
        let payload = FailurePayload::new(None, ErrorBody::Single(item(serde_json::json!(12))));
        assert_eq!(payload.message(), UNKNOWN_ERROR);

        let payload = FailurePayload::new(None, ErrorBody::Other(serde_json::json!("oops")));
        assert_eq!(payload.message(), UNKNOWN_ERROR);
    }

    #[test]
    fn null_response_has_its_own_message() {
        let err = EditorError::NullResponse {
            operation: SyncKind::Insert,
        };
        assert_eq!(
            err.failure_payload().expect("payload").message(),
            NULL_RESPONSE_MESSAGE
        );
        assert!(EditorError::InvalidInput.failure_payload().is_none());
    }
}
