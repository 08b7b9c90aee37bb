use std::time::Duration;
use thiserror::Error;

/// Error type for provider checks, token acquisition and local notifications
#[derive(Debug, Error)]
pub enum PushError {
    // Provider SDK errors
    #[error("Availability check failed for {provider}: {message}")]
    AvailabilityCheck { provider: String, message: String },

    #[error("Token fetch failed: {0}")]
    TokenFetch(String),

    #[error("Token fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    // Backend delivery errors
    #[error("Token delivery failed: {0}")]
    Delivery(String),

    #[error("Token delivery rejected with status {status}: {body}")]
    DeliveryRejected { status: u16, body: String },

    // Notification surface errors
    #[error("Notification error: {0}")]
    Notification(String),

    // Input and setup errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Foreground channel closed")]
    ChannelClosed,

    #[error("No tokio runtime available to run push work")]
    RuntimeUnavailable,
}

pub type PushResult<T> = Result<T, PushError>;

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PushError::Delivery(format!("request timed out: {}", err))
        } else if err.is_connect() {
            PushError::Delivery(format!("connection error: {}", err))
        } else {
            PushError::Delivery(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        PushError::InvalidPayload(err.to_string())
    }
}

impl PushError {
    pub fn availability(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PushError::AvailabilityCheck {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn token_fetch(msg: impl Into<String>) -> Self {
        PushError::TokenFetch(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        PushError::Delivery(msg.into())
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        PushError::Notification(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        PushError::Configuration(msg.into())
    }
}
