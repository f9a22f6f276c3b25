use std::fmt;

/// Classified recommendation-service error — tells the caller *why* the call
/// failed so the screen can surface a useful message.
#[derive(Debug)]
pub struct RecommendationError {
    pub kind: RecommendationErrorKind,
    pub status: Option<u16>,
    pub message: String,
    /// Seconds to wait before retrying (from 429 Retry-After header or body).
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationErrorKind {
    /// 401/403 — bad API key or permissions.
    Auth,
    /// 402 — billing/quota exhausted.
    Billing,
    /// 429 — rate limited; check retry_after_secs.
    RateLimit,
    /// 404 or "model not found" — bad model name.
    NotFound,
    /// 408, request timeout, or provider took too long.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// 500/502/503/504 — provider-side outage.
    ServerError,
    /// The response arrived but did not match the expected JSON shape.
    Malformed,
    /// Anything else.
    Unknown,
}

impl RecommendationError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => RecommendationErrorKind::Auth,
            402 => RecommendationErrorKind::Billing,
            404 => RecommendationErrorKind::NotFound,
            408 => RecommendationErrorKind::Timeout,
            429 => RecommendationErrorKind::RateLimit,
            500 | 502 | 503 | 504 => RecommendationErrorKind::ServerError,
            _ => RecommendationErrorKind::Unknown,
        };

        let retry_after_secs = if kind == RecommendationErrorKind::RateLimit {
            extract_retry_after(body)
        } else {
            None
        };

        Self {
            kind,
            status: Some(status),
            message: truncate_body(body),
            retry_after_secs,
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            RecommendationErrorKind::Timeout
        } else {
            RecommendationErrorKind::Network
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
            retry_after_secs: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: RecommendationErrorKind::Malformed,
            status: None,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// User-facing summary suitable for printing on the result screen.
    pub fn user_message(&self) -> String {
        match self.kind {
            RecommendationErrorKind::Auth => {
                "Gemini API authentication failed. Check your API key in config.toml.".to_string()
            }
            RecommendationErrorKind::Billing => {
                "Gemini API billing error — your account quota may be exhausted.".to_string()
            }
            RecommendationErrorKind::RateLimit => {
                if let Some(secs) = self.retry_after_secs {
                    format!("Rate limited. Try again in {}s.", secs)
                } else {
                    "Rate limited. Try again shortly.".to_string()
                }
            }
            RecommendationErrorKind::NotFound => {
                "Model not found. Check the model names in config.toml.".to_string()
            }
            RecommendationErrorKind::Timeout => "The request timed out. Try again.".to_string(),
            RecommendationErrorKind::Network => {
                "Cannot reach the recommendation service (network error).".to_string()
            }
            RecommendationErrorKind::ServerError => {
                "The recommendation service is experiencing issues (server error).".to_string()
            }
            RecommendationErrorKind::Malformed => {
                "The service returned an unreadable recommendation. Try again.".to_string()
            }
            RecommendationErrorKind::Unknown => format!("Recommendation error: {}", self.message),
        }
    }

    /// Whether re-submitting the same quiz could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            RecommendationErrorKind::RateLimit
                | RecommendationErrorKind::Timeout
                | RecommendationErrorKind::Network
                | RecommendationErrorKind::ServerError
                | RecommendationErrorKind::Malformed
        )
    }
}

impl fmt::Display for RecommendationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "Recommendation error ({}, {:?}): {}", status, self.kind, self.message)
        } else {
            write!(f, "Recommendation error ({:?}): {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RecommendationError {}

/// Try to parse retry_after from a JSON response body.
/// Handles: {"error": {"retry_after": 5}} and {"retry_after": 5}
fn extract_retry_after(body: &str) -> Option<u64> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v["error"]["retry_after"]
        .as_u64()
        .or_else(|| v["retry_after"].as_u64())
        .or_else(|| {
            v["error"]["retry_after"]
                .as_f64()
                .or_else(|| v["retry_after"].as_f64())
                .map(|f| f.ceil() as u64)
        })
}

/// Cap the stored body at 300 bytes, cut back to a char boundary so a
/// multibyte response can never panic the error path itself.
fn truncate_body(body: &str) -> String {
    if body.len() <= 300 {
        return body.to_string();
    }
    let mut end = 300;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(
            RecommendationError::from_status(401, "").kind,
            RecommendationErrorKind::Auth
        );
        assert_eq!(
            RecommendationError::from_status(503, "").kind,
            RecommendationErrorKind::ServerError
        );
        assert_eq!(
            RecommendationError::from_status(418, "").kind,
            RecommendationErrorKind::Unknown
        );
    }

    #[test]
    fn rate_limit_extracts_retry_after() {
        let err = RecommendationError::from_status(429, r#"{"error":{"retry_after":7}}"#);
        assert_eq!(err.kind, RecommendationErrorKind::RateLimit);
        assert_eq!(err.retry_after_secs, Some(7));
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_errors_are_not_retryable() {
        assert!(!RecommendationError::from_status(403, "").is_retryable());
    }

    #[test]
    fn long_body_is_truncated_on_a_char_boundary() {
        // Puts the 300th byte in the middle of a two-byte character.
        let body = format!("{}éllo and more", "a".repeat(299));
        let err = RecommendationError::from_status(500, &body);
        assert!(err.message.ends_with("..."));
        assert!(err.message.len() <= 303);
        assert_eq!(&err.message[..299], "a".repeat(299));

        let short = RecommendationError::from_status(500, "tiny");
        assert_eq!(short.message, "tiny");
    }
}
