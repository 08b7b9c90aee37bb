// src/services/availability_service.rs
use std::sync::Arc;
use tracing;

use crate::{
    errors::PushResult,
    models::{AvailabilityStatus, ProviderKind, Selection},
};

/// Queries one provider's availability API on the current device.
///
/// Results depend on device state that can change at any time, so callers
/// should query again rather than hold on to an old answer.
pub trait AvailabilityProbe: Send + Sync {
    fn provider(&self) -> ProviderKind;
    fn check(&self) -> PushResult<AvailabilityStatus>;
}

/// Decides which push backend to use. GMS is always asked first.
pub struct ProviderAvailabilityChecker {
    gms: Arc<dyn AvailabilityProbe>,
    hms: Arc<dyn AvailabilityProbe>,
}

impl ProviderAvailabilityChecker {
    pub fn new(gms: Arc<dyn AvailabilityProbe>, hms: Arc<dyn AvailabilityProbe>) -> Self {
        Self { gms, hms }
    }

    pub fn is_gms_available(&self) -> bool {
        Self::is_available(self.gms.as_ref())
    }

    pub fn is_hms_available(&self) -> bool {
        Self::is_available(self.hms.as_ref())
    }

    /// HMS is only queried when GMS is unavailable.
    pub fn select_provider(&self) -> Selection {
        if self.is_gms_available() {
            Selection::ProviderSelected(ProviderKind::Gms)
        } else if self.is_hms_available() {
            Selection::ProviderSelected(ProviderKind::Hms)
        } else {
            Selection::NoProvider
        }
    }

    // Fails closed: any probe error counts as unavailable.
    fn is_available(probe: &dyn AvailabilityProbe) -> bool {
        match probe.check() {
            Ok(status) => {
                tracing::debug!("{} availability status: {:?}", probe.provider(), status);
                status.is_success()
            }
            Err(e) => {
                tracing::error!("{} check error: {}", probe.provider(), e);
                false
            }
        }
    }
}

/// Probe with a fixed answer, for hosts that learn availability up front.
#[derive(Debug, Clone)]
pub struct StaticAvailabilityProbe {
    provider: ProviderKind,
    status: AvailabilityStatus,
}

impl StaticAvailabilityProbe {
    pub fn new(provider: ProviderKind, status: AvailabilityStatus) -> Self {
        Self { provider, status }
    }

    pub fn available(provider: ProviderKind) -> Self {
        Self::new(provider, AvailabilityStatus::Success)
    }

    pub fn missing(provider: ProviderKind) -> Self {
        Self::new(provider, AvailabilityStatus::ServiceMissing)
    }
}

impl AvailabilityProbe for StaticAvailabilityProbe {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn check(&self) -> PushResult<AvailabilityStatus> {
        Ok(self.status)
    }
}
