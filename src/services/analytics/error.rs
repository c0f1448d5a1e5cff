use serde_json::Value;
use thiserror::Error;

/// Why an analytics call did not go through.
///
/// Transport failures and provider rejections are kept apart so a bad API key
/// is not mistaken for a flaky network.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Missing credentials, endpoint, or event body. Nothing left the process.
    #[error("analytics call not authorized: missing api key, url or body")]
    NotAuthorized,
    /// Gated locally: untrackable request, empty event name, disabled provider.
    #[error("analytics event not sent")]
    NotSent,
    #[error("analytics transport error: {0}")]
    Transport(String),
    #[error("analytics provider rejected event with status {status}")]
    Api { status: u16, errors: Value },
}

impl AnalyticsError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalyticsError::NotAuthorized => FailureKind::NotAuthorized,
            AnalyticsError::NotSent => FailureKind::NotSent,
            AnalyticsError::Transport(_) => FailureKind::Transport,
            AnalyticsError::Api { .. } => FailureKind::Api,
        }
    }
}

impl From<reqwest::Error> for AnalyticsError {
    fn from(e: reqwest::Error) -> Self {
        AnalyticsError::Transport(e.to_string())
    }
}

/// Content-free classification, safe to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotAuthorized,
    NotSent,
    Transport,
    Api,
}
