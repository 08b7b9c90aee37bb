// src/services/push_manager.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing;

use crate::{
    errors::PushError,
    models::{FetchOutcome, ProviderKind, Selection},
    services::{
        availability_service::ProviderAvailabilityChecker,
        session::{ForegroundHandle, PushSession},
        token_service::{TokenRequest, TokenSource},
    },
};

/// Selects a push provider and acquires a registration token from it.
pub struct PushServiceManager {
    checker: ProviderAvailabilityChecker,
    sources: HashMap<ProviderKind, (Arc<dyn TokenSource>, TokenRequest)>,
    fetch_timeout: Duration,
}

impl PushServiceManager {
    pub fn new(checker: ProviderAvailabilityChecker, fetch_timeout: Duration) -> Self {
        Self {
            checker,
            sources: HashMap::new(),
            fetch_timeout,
        }
    }

    /// Registers the token path for a provider. Without one, selecting that
    /// provider does not fetch anything.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>, request: TokenRequest) -> Self {
        self.sources.insert(source.provider(), (source, request));
        self
    }

    pub fn checker(&self) -> &ProviderAvailabilityChecker {
        &self.checker
    }

    /// Runs provider selection and, when a token path exists for the
    /// selected provider, starts one fetch inside `session`.
    pub fn get_push_token(&self, session: &mut PushSession) -> Selection {
        let selection = self.checker.select_provider();

        match selection {
            Selection::NoProvider => {
                tracing::warn!("Neither GMS nor HMS is available");
            }
            Selection::ProviderSelected(provider) => match self.sources.get(&provider) {
                Some((source, request)) => {
                    tracing::info!("{} selected, fetching push token", provider);
                    let foreground = session.foreground();
                    session.spawn_fetch(fetch_token(
                        source.clone(),
                        request.clone(),
                        self.fetch_timeout,
                        foreground,
                    ));
                }
                None => {
                    tracing::info!("{} selected, no token source registered", provider);
                }
            },
        }

        selection
    }
}

async fn fetch_token(
    source: Arc<dyn TokenSource>,
    request: TokenRequest,
    timeout: Duration,
    foreground: ForegroundHandle,
) -> FetchOutcome {
    let provider = source.provider();

    let result = match tokio::time::timeout(timeout, source.get_token(&request)).await {
        Ok(Ok(token)) if token.is_empty() => Err(PushError::token_fetch("provider returned an empty token")),
        Ok(result) => result,
        Err(_) => Err(PushError::FetchTimeout(timeout)),
    };

    match result {
        Ok(token) => {
            tracing::info!("{} Token: {}", provider, token);
            if let Err(e) = foreground.dispatch_token(token.clone(), provider) {
                tracing::error!("Could not hand {} token to foreground: {}", provider, e);
            }
            FetchOutcome::TokenObtained { provider, token }
        }
        Err(e) => {
            tracing::error!("Failed to get {} token: {}", provider, e);
            FetchOutcome::FetchFailed { provider }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::PushResult,
        models::PushToken,
        services::{
            availability_service::StaticAvailabilityProbe,
            delivery_service::MockTokenDelivery,
            token_service::StaticTokenSource,
        },
    };
    use async_trait::async_trait;

    struct HangingSource;

    #[async_trait]
    impl TokenSource for HangingSource {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Hms
        }

        async fn get_token(&self, _request: &TokenRequest) -> PushResult<PushToken> {
            std::future::pending().await
        }
    }

    fn hms_only() -> ProviderAvailabilityChecker {
        ProviderAvailabilityChecker::new(
            Arc::new(StaticAvailabilityProbe::missing(ProviderKind::Gms)),
            Arc::new(StaticAvailabilityProbe::available(ProviderKind::Hms)),
        )
    }

    #[tokio::test]
    async fn test_hms_token_is_delivered() {
        let delivery = MockTokenDelivery::new();
        let mut session = PushSession::new(delivery.clone()).unwrap();
        let manager = PushServiceManager::new(hms_only(), Duration::from_secs(5))
            .with_token_source(
                Arc::new(StaticTokenSource::new(ProviderKind::Hms, "tok-123")),
                TokenRequest::new("113669113", "HCM"),
            );

        let selection = manager.get_push_token(&mut session);
        assert_eq!(selection, Selection::ProviderSelected(ProviderKind::Hms));

        let outcomes = session.wait().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].token(), Some(&PushToken::new("tok-123")));
        assert_eq!(delivery.delivered(), vec![(PushToken::new("tok-123"), ProviderKind::Hms)]);
    }

    #[tokio::test]
    async fn test_fetch_timeout_fails_without_delivery() {
        let delivery = MockTokenDelivery::new();
        let mut session = PushSession::new(delivery.clone()).unwrap();
        let manager = PushServiceManager::new(hms_only(), Duration::from_millis(20))
            .with_token_source(Arc::new(HangingSource), TokenRequest::new("1", "HCM"));

        manager.get_push_token(&mut session);
        let outcomes = session.wait().await;

        assert_eq!(outcomes, vec![FetchOutcome::FetchFailed { provider: ProviderKind::Hms }]);
        assert!(delivery.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_selected_provider_without_source_is_noop() {
        let mut session = PushSession::new(MockTokenDelivery::new()).unwrap();
        let manager = PushServiceManager::new(hms_only(), Duration::from_secs(5));

        let selection = manager.get_push_token(&mut session);
        assert_eq!(selection.provider(), ProviderKind::Hms);
        assert_eq!(session.pending(), 0);
    }

    #[tokio::test]
    async fn test_empty_token_counts_as_failed_fetch() {
        let delivery = MockTokenDelivery::new();
        let mut session = PushSession::new(delivery.clone()).unwrap();
        let manager = PushServiceManager::new(hms_only(), Duration::from_secs(5))
            .with_token_source(
                Arc::new(StaticTokenSource::new(ProviderKind::Hms, "")),
                TokenRequest::new("113669113", "HCM"),
            );

        manager.get_push_token(&mut session);
        let outcomes = session.wait().await;

        assert_eq!(outcomes, vec![FetchOutcome::FetchFailed { provider: ProviderKind::Hms }]);
        assert!(delivery.delivered().is_empty());
    }
}
