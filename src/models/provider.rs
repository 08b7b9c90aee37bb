// src/models/provider.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Push backend usable on the current device. Determined once per check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    Gms,
    Hms,
    None,
}

impl ProviderKind {
    /// Label handed to the backend alongside the token.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Gms => "GMS",
            ProviderKind::Hms => "HMS",
            ProviderKind::None => "NONE",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result code reported by a provider's availability API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Success,
    ServiceMissing,
    ServiceUpdating,
    ServiceVersionUpdateRequired,
    ServiceDisabled,
    ServiceInvalid,
}

impl AvailabilityStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AvailabilityStatus::Success)
    }
}

/// Outcome of provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    NoProvider,
    ProviderSelected(ProviderKind),
}

impl Selection {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Selection::NoProvider => ProviderKind::None,
            Selection::ProviderSelected(kind) => *kind,
        }
    }
}
