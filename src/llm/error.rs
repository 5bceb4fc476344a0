use thiserror::Error;

/// Failure modes of a single completion call.
///
/// The `Display` text of every variant is the reply shown to the user, so callers that must
/// never fail can absorb the error with `to_string()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    #[error(
        "⚠️ AI Assistant is not configured. Please add your Groq API key to enable this feature.\n\nSteps:\n1. Copy .env.example to .env\n2. Get your API key from https://console.groq.com/keys\n3. Add GROQ_API_KEY=your_key_here to .env\n4. Restart the assistant server"
    )]
    Unconfigured,

    #[error("❌ Invalid API key. Please check your GROQ_API_KEY in the .env file.")]
    Unauthorized,

    #[error("⏳ Rate limit reached. Please try again in a moment.")]
    Throttled,

    #[error("❌ Error: {status} - {status_text}")]
    ServiceError { status: u16, status_text: String },

    #[error("No response received from AI assistant.")]
    MalformedResponse,

    /// The detail is kept for logs only.
    #[error("🌐 Network error. Please check your internet connection.")]
    NetworkFailure(String),

    #[error("❌ Error: {}", .0.as_deref().unwrap_or("Unknown error occurred"))]
    Unknown(Option<String>),
}

impl AssistantError {
    /// `reason` is the reason phrase the server actually sent, when it differs from the
    /// canonical one. HTTP/2 responses never carry one.
    pub fn from_status(status: reqwest::StatusCode, reason: Option<&str>) -> Self {
        match status.as_u16() {
            401 => AssistantError::Unauthorized,
            429 => AssistantError::Throttled,
            code => AssistantError::ServiceError {
                status: code,
                status_text: reason
                    .or(status.canonical_reason())
                    .unwrap_or_default()
                    .to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            AssistantError::NetworkFailure(err.to_string())
        } else {
            AssistantError::Unknown(Some(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping() {
        assert_eq!(AssistantError::from_status(StatusCode::UNAUTHORIZED, None), AssistantError::Unauthorized);
        assert_eq!(
            AssistantError::from_status(StatusCode::TOO_MANY_REQUESTS, Some("Slow Down")),
            AssistantError::Throttled
        );
        assert_eq!(
            AssistantError::from_status(StatusCode::SERVICE_UNAVAILABLE, None).to_string(),
            "❌ Error: 503 - Service Unavailable"
        );
    }

    #[test]
    fn sent_reason_phrase_wins() {
        assert_eq!(
            AssistantError::from_status(StatusCode::SERVICE_UNAVAILABLE, Some("Model Overloaded")).to_string(),
            "❌ Error: 503 - Model Overloaded"
        );
        let unregistered = StatusCode::from_u16(599).unwrap();
        assert_eq!(AssistantError::from_status(unregistered, None).to_string(), "❌ Error: 599 - ");
    }

    #[test]
    fn unknown_without_message() {
        assert_eq!(AssistantError::Unknown(None).to_string(), "❌ Error: Unknown error occurred");
        assert_eq!(
            AssistantError::Unknown(Some("boom".to_string())).to_string(),
            "❌ Error: boom"
        );
    }

    #[test]
    fn network_detail_is_not_shown() {
        let err = AssistantError::NetworkFailure("dns error: no such host".to_string());
        assert_eq!(err.to_string(), "🌐 Network error. Please check your internet connection.");
    }

    #[test]
    fn unconfigured_text_names_the_env_var() {
        let text = AssistantError::Unconfigured.to_string();
        assert!(text.starts_with("⚠️ AI Assistant is not configured."));
        assert!(text.contains("GROQ_API_KEY=your_key_here"));
    }
}
