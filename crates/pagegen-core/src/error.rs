//! Error types for a generation request.

use thiserror::Error;

/// Everything that can go wrong between pressing Generate and having markup.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No bearer credential was configured, so no request was sent.
    #[error("OpenRouter API key not configured (set OPENROUTER_API_KEY)")]
    MissingApiKey,

    /// Connect, TLS, timeout or other transport failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("API error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body was not JSON or lacked `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request task ended without reporting an outcome.
    #[error("request aborted before it completed")]
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_includes_body() {
        let err = GenerateError::HttpStatus {
            status: 401,
            body: "No auth credentials found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 401: No auth credentials found");
    }

    #[test]
    fn test_malformed_message_names_missing_field() {
        let err = GenerateError::MalformedResponse("missing field `choices`".to_string());
        assert!(err.to_string().starts_with("malformed response"));
        assert!(err.to_string().contains("choices"));
    }
}
