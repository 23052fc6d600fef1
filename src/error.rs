use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PollenError {
    /// The prompt trimmed to an empty string; no request was issued.
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request error: {0}")]
    Request(String),

    /// The request never completed (DNS, connectivity, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status from the service, carrying the most specific message
    /// the response body yielded.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response error: {0}")]
    Response(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Preference store error: {0}")]
    Store(String),
}

impl PollenError {
    /// Validation skips are absorbed by callers rather than reported.
    pub fn is_validation_skip(&self) -> bool {
        matches!(self, PollenError::EmptyPrompt)
    }
}

pub type Result<T> = std::result::Result<T, PollenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_render_status_and_message() {
        let err = PollenError::Api {
            status: 502,
            message: "model overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (502): model overloaded");
    }

    #[test]
    fn only_empty_prompts_are_validation_skips() {
        assert!(PollenError::EmptyPrompt.is_validation_skip());
        assert!(!PollenError::Network("refused".to_string()).is_validation_skip());
    }
}
