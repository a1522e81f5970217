use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - API key rejected")]
    Unauthorized,

    #[error("Table or row not found: {0}")]
    NotFound(String),

    /// The service understood the request but refused its shape (unknown
    /// column, malformed filter, bad embed).
    #[error("Query rejected: {0}")]
    QueryRejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body the data service sends alongside non-2xx statuses, e.g.
/// `{"code":"42703","message":"column players.nam does not exist","details":null,"hint":null}`.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl ServiceErrorBody {
    fn describe(&self) -> String {
        let mut out = match self.code.as_deref() {
            Some(code) if !code.is_empty() => format!("{} [{}]", self.message, code),
            _ => self.message.clone(),
        };
        if let Some(details) = self.details.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(": ");
            out.push_str(details);
        }
        if let Some(hint) = self.hint.as_deref().filter(|h| !h.is_empty()) {
            out.push_str(" (hint: ");
            out.push_str(hint);
            out.push(')');
        }
        out
    }
}

impl RemoteError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Message for an error body: the service's structured error when it
    /// sent one, the raw body otherwise.
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ServiceErrorBody>(body) {
            Ok(parsed) => Self::truncate_body(&parsed.describe()),
            Err(_) => Self::truncate_body(body.trim()),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::describe_body(body);
        match status.as_u16() {
            400 | 406 | 416 => RemoteError::QueryRejected(message),
            401 => RemoteError::Unauthorized,
            403 => RemoteError::AccessDenied(message),
            404 => RemoteError::NotFound(message),
            429 => RemoteError::RateLimited,
            500..=599 => RemoteError::ServerError(message),
            _ => RemoteError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            RemoteError::from_status(StatusCode::UNAUTHORIZED, ""),
            RemoteError::Unauthorized
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::FORBIDDEN, "rls"),
            RemoteError::AccessDenied(ref b) if b == "rls"
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::NOT_FOUND, "no table"),
            RemoteError::NotFound(_)
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            RemoteError::RateLimited
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::BAD_GATEWAY, ""),
            RemoteError::ServerError(_)
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::BAD_REQUEST, "bad filter"),
            RemoteError::QueryRejected(ref m) if m == "bad filter"
        ));
        assert!(matches!(
            RemoteError::from_status(StatusCode::IM_A_TEAPOT, "teapot"),
            RemoteError::InvalidResponse(ref m) if m.contains("418") && m.contains("teapot")
        ));
    }

    #[test]
    fn test_service_error_body_is_unpacked() {
        let body = r#"{"code":"42703","details":null,"hint":"Perhaps you meant \"name\"","message":"column players.nam does not exist"}"#;
        match RemoteError::from_status(StatusCode::BAD_REQUEST, body) {
            RemoteError::QueryRejected(msg) => assert_eq!(
                msg,
                "column players.nam does not exist [42703] (hint: Perhaps you meant \"name\")"
            ),
            other => panic!("unexpected {:?}", other),
        }

        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        match RemoteError::from_status(StatusCode::NOT_ACCEPTABLE, body) {
            RemoteError::QueryRejected(msg) => {
                assert!(msg.starts_with("JSON object requested"));
                assert!(msg.ends_with("[PGRST116]: The result contains 0 rows"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_passes_through() {
        match RemoteError::from_status(StatusCode::BAD_GATEWAY, "  <html>upstream down</html>\n") {
            RemoteError::ServerError(msg) => assert_eq!(msg, "<html>upstream down</html>"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        match RemoteError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            RemoteError::ServerError(msg) => {
                assert!(msg.contains("truncated, 800 total bytes"));
                assert!(msg.len() < body.len());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
