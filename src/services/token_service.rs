// src/services/token_service.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::{PushError, PushResult},
    models::{ProviderKind, PushToken},
};

/// Identifies the app to the provider when requesting a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub app_id: String,
    pub scope: String,
}

impl TokenRequest {
    pub fn new(app_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            scope: scope.into(),
        }
    }
}

/// Provider SDK call that issues a registration token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn provider(&self) -> ProviderKind;
    async fn get_token(&self, request: &TokenRequest) -> PushResult<PushToken>;
}

type BlockingFetch = dyn Fn(&TokenRequest) -> PushResult<PushToken> + Send + Sync;

/// Wraps a blocking SDK call and runs it on the blocking thread pool.
pub struct BlockingTokenSource {
    provider: ProviderKind,
    fetch: Arc<BlockingFetch>,
}

impl BlockingTokenSource {
    pub fn new<F>(provider: ProviderKind, fetch: F) -> Self
    where
        F: Fn(&TokenRequest) -> PushResult<PushToken> + Send + Sync + 'static,
    {
        Self {
            provider,
            fetch: Arc::new(fetch),
        }
    }
}

#[async_trait]
impl TokenSource for BlockingTokenSource {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn get_token(&self, request: &TokenRequest) -> PushResult<PushToken> {
        let fetch = self.fetch.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || fetch(&request))
            .await
            .map_err(|e| PushError::token_fetch(format!("token worker failed: {}", e)))?
    }
}

/// Token source that always hands out the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    provider: ProviderKind,
    token: PushToken,
}

impl StaticTokenSource {
    pub fn new(provider: ProviderKind, token: impl Into<PushToken>) -> Self {
        Self {
            provider,
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn get_token(&self, _request: &TokenRequest) -> PushResult<PushToken> {
        Ok(self.token.clone())
    }
}
