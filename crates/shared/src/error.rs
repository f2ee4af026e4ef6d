use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

/// One entry of an error body. `message` is kept loose because failure
/// payloads are not always produced by this server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

/// Body of a failed backend call: a list of errors (one per rejected
/// row), a list of arbitrary entries, a single error object, or something
/// unrecognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    List(Vec<ErrorItem>),
    Entries(Vec<serde_json::Value>),
    Single(ErrorItem),
    Other(serde_json::Value),
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        ErrorBody::Single(ErrorItem {
            message: Some(serde_json::Value::String(message.into())),
        })
    }

    pub fn from_api_errors(errors: &[ApiError]) -> Self {
        ErrorBody::List(
            errors
                .iter()
                .map(|err| ErrorItem {
                    message: Some(serde_json::Value::String(err.message.clone())),
                })
                .collect(),
        )
    }
}

impl From<ApiError> for ErrorBody {
    fn from(value: ApiError) -> Self {
        ErrorBody::message(value.message)
    }
}
