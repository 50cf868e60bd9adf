//! `{status, message, data}` envelope shared by every JSON response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Outcome kind carried in the `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
}

/// JSON response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T = ()> {
    #[serde(skip)]
    code: StatusCode,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// Successful response carrying only a message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK,
            status: ResponseStatus::Success,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failed response carrying only a message
    pub fn fail(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: ResponseStatus::Fail,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying a payload and no message
    pub fn with_data(data: T) -> Self {
        Self {
            code: StatusCode::OK,
            status: ResponseStatus::Success,
            message: None,
            data: Some(data),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status_code(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }

    #[cfg(test)]
    fn code(&self) -> StatusCode {
        self.code
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}
