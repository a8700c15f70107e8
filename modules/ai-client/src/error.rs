use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        param: Option<String>,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl AiError {
    /// Build an `Api` error from a raw error body.
    ///
    /// Understands the `{"error": {"message", "code", "param"}}` envelope and
    /// falls back to the raw body as the message.
    pub fn from_api_body(status: u16, body: &str) -> Self {
        let envelope: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let error = envelope.as_ref().and_then(|v| v.get("error"));

        let field = |name: &str| {
            error
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        AiError::Api {
            status,
            message: field("message").unwrap_or_else(|| body.trim().to_string()),
            code: field("code"),
            param: field("param"),
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openai_error_envelope() {
        let body = r#"{"error": {"message": "Unsupported parameter: 'temperature'.", "type": "invalid_request_error", "param": "temperature", "code": "unsupported_parameter"}}"#;
        match AiError::from_api_body(400, body) {
            AiError::Api {
                status,
                message,
                code,
                param,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported parameter: 'temperature'.");
                assert_eq!(code.as_deref(), Some("unsupported_parameter"));
                assert_eq!(param.as_deref(), Some("temperature"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        match AiError::from_api_body(502, "  Bad Gateway\n") {
            AiError::Api {
                message, code, param, ..
            } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_none());
                assert!(param.is_none());
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
