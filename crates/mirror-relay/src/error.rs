//! Error types for the relay.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised while handling a single webhook call.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body is not valid JSON or an event lacks its item id.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Body carries neither `challenge` nor `event`.
    #[error("No challenge or event field found in the received JSON payload")]
    UnrecognizedPayload,

    /// Item query failed (transport, non-2xx status, GraphQL errors).
    #[error("Failed to fetch item info: {0}")]
    UpstreamFetch(String),

    /// Item query succeeded but an expected field is missing.
    #[error("Malformed item data: missing {0}")]
    MalformedUpstreamData(String),

    /// A single `create_update` call failed. Logged, never returned to the caller.
    #[error("Failed to create update on item {item_id}: {reason}")]
    UpdateCreationFailed {
        /// Target item id
        item_id: String,
        /// Failure description
        reason: String,
    },
}

impl RelayError {
    /// HTTP status reported to the webhook sender.
    ///
    /// `UpdateCreationFailed` never reaches a response: the fan-out loop logs
    /// it and moves on, and the call still answers 200. It maps to 500 only
    /// so the match stays exhaustive.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) | Self::UnrecognizedPayload => StatusCode::BAD_REQUEST,
            Self::UpstreamFetch(_) | Self::MalformedUpstreamData(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // Logged by the fan-out loop, not returned
            Self::UpdateCreationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Errors from the monday.com GraphQL client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// API answered 200 with a GraphQL `errors` array
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configured token or version cannot be sent as a header
    #[error("Invalid {0} header value")]
    InvalidHeader(&'static str),

    /// Response decoded but lacked the expected data
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RelayError::MalformedPayload("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::UnrecognizedPayload.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::UpstreamFetch("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::MalformedUpstreamData("data.me.name".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        let err = RelayError::UpdateCreationFailed {
            item_id: "42".into(),
            reason: "status 500".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create update on item 42: status 500"
        );

        let err = ClientError::Status {
            status: 401,
            body: "Not Authenticated".into(),
        };
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_into_response_status() {
        let response = RelayError::UnrecognizedPayload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = RelayError::UpstreamFetch("timeout".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
