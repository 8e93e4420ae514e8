use serde_json::Value;
use thiserror::Error;

/// Payload fields checked, in order, for a human-readable error message.
pub const MESSAGE_FIELDS: &[&str] = &["msg", "message", "error"];

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend rejected request ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Backend { status: u16, message: Option<String> },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message to show the user, or `fallback` when the backend gave none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Backend {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Only transport failures and 5xx responses count against the circuit.
    pub(crate) fn trips_circuit(&self) -> bool {
        match self {
            ApiError::Request(_) => true,
            ApiError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// First non-empty string among [`MESSAGE_FIELDS`].
pub fn message_from_payload(payload: &Value) -> Option<String> {
    MESSAGE_FIELDS.iter().find_map(|field| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_field_order() {
        let payload = json!({"error": "third", "message": "second", "msg": "first"});
        assert_eq!(message_from_payload(&payload).as_deref(), Some("first"));

        let payload = json!({"error": "third", "message": "second"});
        assert_eq!(message_from_payload(&payload).as_deref(), Some("second"));

        let payload = json!({"error": "third", "msg": "  "});
        assert_eq!(message_from_payload(&payload).as_deref(), Some("third"));
    }

    #[test]
    fn test_message_missing() {
        assert_eq!(message_from_payload(&json!({"code": 11})), None);
        assert_eq!(message_from_payload(&json!("plain string")), None);
        assert_eq!(message_from_payload(&json!({"msg": 42})), None);
    }

    #[test]
    fn test_user_message_fallback() {
        let error = ApiError::Backend {
            status: 401,
            message: Some("Invalid credentials".to_string()),
        };
        assert_eq!(error.user_message("Login failed"), "Invalid credentials");

        let error = ApiError::Backend {
            status: 500,
            message: None,
        };
        assert_eq!(error.user_message("Login failed"), "Login failed");

        let error = ApiError::CircuitOpen("open".to_string());
        assert_eq!(error.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn test_circuit_tripping() {
        let client_error = ApiError::Backend {
            status: 400,
            message: None,
        };
        let server_error = ApiError::Backend {
            status: 503,
            message: None,
        };
        assert!(!client_error.trips_circuit());
        assert!(server_error.trips_circuit());
        assert!(!ApiError::InvalidResponse("x".into()).trips_circuit());
    }
}
