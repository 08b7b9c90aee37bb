// src/state.rs
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::{PushError, PushResult},
    models::{NotificationChannel, ProviderKind},
    services::{
        availability_service::{AvailabilityProbe, ProviderAvailabilityChecker},
        delivery_service::{HttpTokenDelivery, MockTokenDelivery, TokenDelivery},
        messaging_service::{ContentMode, PushMessageHandler},
        notification_service::{LocalNotifier, NotificationIdPolicy, NotificationSurface},
        push_manager::PushServiceManager,
        session::PushSession,
        token_service::{TokenRequest, TokenSource},
    },
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hms_app_id: String,
    pub hms_token_scope: String,
    pub gms_sender_id: Option<String>,
    pub gms_token_scope: String,
    pub channel_id: String,
    pub channel_name: String,
    pub token_endpoint: Option<String>,
    pub fetch_timeout_secs: u64,
    pub notification_ids: NotificationIdPolicy,
    pub content_mode: ContentMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hms_app_id: "113669113".to_string(),
            hms_token_scope: "HCM".to_string(),
            gms_sender_id: None,
            gms_token_scope: "FCM".to_string(),
            channel_id: "hms_channel".to_string(),
            channel_name: "HMS Notifications".to_string(),
            token_endpoint: None,
            fetch_timeout_secs: 30,
            notification_ids: NotificationIdPolicy::default(),
            content_mode: ContentMode::default(),
        }
    }
}

impl AppConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> PushResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> PushResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(app_id) = lookup("HMS_APP_ID") {
            config.hms_app_id = app_id;
        }
        if let Some(scope) = lookup("HMS_TOKEN_SCOPE") {
            config.hms_token_scope = scope;
        }
        config.gms_sender_id = lookup("GMS_SENDER_ID").filter(|id| !id.trim().is_empty());
        if let Some(scope) = lookup("GMS_TOKEN_SCOPE") {
            config.gms_token_scope = scope;
        }
        if let Some(id) = lookup("PUSH_CHANNEL_ID") {
            config.channel_id = id;
        }
        if let Some(name) = lookup("PUSH_CHANNEL_NAME") {
            config.channel_name = name;
        }
        config.token_endpoint = lookup("PUSH_TOKEN_ENDPOINT").filter(|e| !e.trim().is_empty());

        if let Some(raw) = lookup("PUSH_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = raw.trim().parse().map_err(|_| {
                PushError::configuration(format!("PUSH_FETCH_TIMEOUT_SECS is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("PUSH_NOTIFICATION_IDS") {
            config.notification_ids = match raw.trim() {
                "fixed" => NotificationIdPolicy::Fixed(0),
                "sequential" => NotificationIdPolicy::Sequential,
                other => {
                    return Err(PushError::configuration(format!(
                        "PUSH_NOTIFICATION_IDS must be 'fixed' or 'sequential', got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(raw) = lookup("PUSH_CONTENT_MODE") {
            config.content_mode = match raw.trim() {
                "raw" => ContentMode::RawPayload,
                "keyed" => ContentMode::keyed(),
                other => {
                    return Err(PushError::configuration(format!(
                        "PUSH_CONTENT_MODE must be 'raw' or 'keyed', got '{}'",
                        other
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PushResult<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(PushError::configuration("fetch timeout must be at least one second"));
        }
        if self.channel_id.trim().is_empty() {
            return Err(PushError::configuration("notification channel id is empty"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Device-side collaborators supplied by the host platform.
pub struct Platform {
    pub gms_probe: Arc<dyn AvailabilityProbe>,
    pub hms_probe: Arc<dyn AvailabilityProbe>,
    pub hms_token_source: Arc<dyn TokenSource>,
    pub gms_token_source: Option<Arc<dyn TokenSource>>,
    pub surface: Arc<dyn NotificationSurface>,
}

pub struct AppState {
    pub push_manager: Arc<PushServiceManager>,
    pub notifier: Arc<LocalNotifier>,
    pub delivery: Arc<dyn TokenDelivery>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, platform: Platform) -> PushResult<Self> {
        config.validate()?;

        let delivery: Arc<dyn TokenDelivery> = match &config.token_endpoint {
            Some(endpoint) => Arc::new(HttpTokenDelivery::new(endpoint.clone())),
            None => {
                tracing::warn!("PUSH_TOKEN_ENDPOINT not set, using mock token delivery");
                MockTokenDelivery::new()
            }
        };

        let checker = ProviderAvailabilityChecker::new(platform.gms_probe, platform.hms_probe);
        let mut push_manager = PushServiceManager::new(checker, config.fetch_timeout())
            .with_token_source(
                platform.hms_token_source,
                TokenRequest::new(config.hms_app_id.clone(), config.hms_token_scope.clone()),
            );
        if let Some(gms_source) = platform.gms_token_source {
            let sender_id = config.gms_sender_id.clone().ok_or_else(|| {
                PushError::configuration("GMS_SENDER_ID is required when a GMS token source is registered")
            })?;
            push_manager = push_manager.with_token_source(
                gms_source,
                TokenRequest::new(sender_id, config.gms_token_scope.clone()),
            );
        }

        let notifier = Arc::new(LocalNotifier::new(
            platform.surface,
            NotificationChannel::new(config.channel_id.clone(), config.channel_name.clone()),
            config.notification_ids,
        ));

        Ok(Self {
            push_manager: Arc::new(push_manager),
            notifier,
            delivery,
            config,
        })
    }

    /// Replaces the token delivery chosen from configuration.
    pub fn with_delivery(mut self, delivery: Arc<dyn TokenDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    /// Opens a lifecycle scope; drop it to cancel outstanding work.
    /// Needs a running tokio runtime.
    pub fn start_session(&self) -> PushResult<PushSession> {
        PushSession::new(self.delivery.clone())
    }

    pub fn message_handler(&self, provider: ProviderKind, session: &PushSession) -> PushMessageHandler {
        PushMessageHandler::new(
            provider,
            self.notifier.clone(),
            session.foreground(),
            self.config.content_mode.clone(),
        )
    }
}
