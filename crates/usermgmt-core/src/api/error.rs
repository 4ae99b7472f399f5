use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body shape used by the server: `{"message": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the server's `message` out of an error body, if it has one.
    fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::message_from_body(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 409 => ApiError::BadRequest(detail),
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// The user-displayable message the server sent with this error, if any.
    ///
    /// Transport failures and bodies without a `message` field yield `None`,
    /// so callers can substitute their own wording.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::AccessDenied(m)
            | ApiError::NotFound(m)
            | ApiError::ServerError(m) => {
                let m = m.trim();
                // Raw (non-JSON) bodies are not meant for display
                if m.is_empty() || m.starts_with('{') || m.starts_with('<') {
                    None
                } else {
                    Some(m)
                }
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Extract the server message from an `anyhow::Error` wrapping an `ApiError`.
    pub fn message_of(err: &anyhow::Error) -> Option<String> {
        err.downcast_ref::<ApiError>()
            .and_then(ApiError::server_message)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_variants() {
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, ""),
            ApiError::BadRequest(_)
        ));
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_server_message_from_json_body() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"message":"Bad username or password"}"#);
        assert_eq!(err.server_message(), Some("Bad username or password"));
        assert_eq!(err.to_string(), "Unauthorized: Bad username or password");
    }

    #[test]
    fn test_server_message_absent() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#);
        assert_eq!(err.server_message(), None);

        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.server_message(), None);

        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"message":"  "}"#);
        assert_eq!(err.server_message(), None);

        assert_eq!(ApiError::RateLimited.server_message(), None);
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, &body);
        let msg = err.to_string();
        assert!(msg.contains("truncated"));
        assert!(msg.contains(&format!("{} total bytes", body.len())));
    }

    #[test]
    fn test_message_of_anyhow() {
        let err: anyhow::Error = ApiError::BadRequest("Username already taken".to_string()).into();
        assert_eq!(ApiError::message_of(&err).as_deref(), Some("Username already taken"));

        let other = anyhow::anyhow!("something else");
        assert_eq!(ApiError::message_of(&other), None);
    }
}
