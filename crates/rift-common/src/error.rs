use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a caller-level retry could plausibly succeed.
    ///
    /// Provider errors carry the HTTP status in their message as `status=NNN`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Provider(message) => {
                let message = message.to_ascii_lowercase();
                if let Some(status) = extract_status_code(&message) {
                    return matches!(status, 429 | 500 | 502 | 503 | 529);
                }
                [
                    "timed out",
                    "timeout",
                    "connection refused",
                    "connection reset",
                    "temporarily unavailable",
                    "dns error",
                    "network error",
                ]
                .iter()
                .any(|fragment| message.contains(fragment))
            }
            _ => false,
        }
    }
}

fn extract_status_code(message: &str) -> Option<u16> {
    let offset = message.find("status=")?;
    let digits: String = message[offset + "status=".len()..]
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    if digits.len() == 3 {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classifier_matches_expected_cases() {
        assert!(Error::Provider("anthropic API error: status=429, body=slow down".into()).is_retryable());
        assert!(Error::Provider("anthropic API error: status=529, body=overloaded".into()).is_retryable());
        assert!(Error::Provider("network error: connection reset by peer".into()).is_retryable());
        assert!(Error::Timeout(Duration::from_secs(30)).is_retryable());

        assert!(!Error::Provider("anthropic API error: status=401, body=bad key".into()).is_retryable());
        assert!(!Error::Provider("malformed response: missing content".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn display_includes_variant_prefix() {
        assert_eq!(
            Error::Tool("unknown tool: warp".into()).to_string(),
            "tool error: unknown tool: warp"
        );
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
    }
}
