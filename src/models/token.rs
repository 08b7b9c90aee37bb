// src/models/token.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::ProviderKind;

/// Opaque registration token issued by a provider SDK. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushToken(String);

impl PushToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PushToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PushToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Terminal state of a single background token fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    TokenObtained { provider: ProviderKind, token: PushToken },
    FetchFailed { provider: ProviderKind },
}

impl FetchOutcome {
    pub fn token(&self) -> Option<&PushToken> {
        match self {
            FetchOutcome::TokenObtained { token, .. } => Some(token),
            FetchOutcome::FetchFailed { .. } => None,
        }
    }
}
