// src/services/messaging_service.rs
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing;

use crate::{
    models::{NotificationPayload, ProviderKind, PushToken, RemoteMessage},
    services::{notification_service::LocalNotifier, session::ForegroundHandle},
};

/// How the title and body of a notification are taken from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Title and body are both the whole data mapping.
    RawPayload,
    /// Title and body are read from dedicated keys; a missing key falls
    /// back to the whole data mapping.
    Keyed { title_key: String, body_key: String },
}

impl Default for ContentMode {
    fn default() -> Self {
        Self::RawPayload
    }
}

impl ContentMode {
    pub fn keyed() -> Self {
        Self::Keyed {
            title_key: "title".to_string(),
            body_key: "body".to_string(),
        }
    }

    fn extract(&self, data: &NotificationPayload) -> (String, String) {
        match self {
            ContentMode::RawPayload => {
                let rendered = data.to_string();
                (rendered.clone(), rendered)
            }
            ContentMode::Keyed { title_key, body_key } => {
                let field = |key: &str| {
                    data.get(key)
                        .map(str::to_string)
                        .unwrap_or_else(|| data.to_string())
                };
                (field(title_key.as_str()), field(body_key.as_str()))
            }
        }
    }
}

/// Entry points the platform push runtime calls into.
pub struct PushMessageHandler {
    provider: ProviderKind,
    notifier: Arc<LocalNotifier>,
    foreground: ForegroundHandle,
    content_mode: ContentMode,
}

impl PushMessageHandler {
    pub fn new(
        provider: ProviderKind,
        notifier: Arc<LocalNotifier>,
        foreground: ForegroundHandle,
        content_mode: ContentMode,
    ) -> Self {
        Self {
            provider,
            notifier,
            foreground,
            content_mode,
        }
    }

    /// The runtime rotated the token; forward it to the backend.
    pub fn on_new_token(&self, token: PushToken) {
        tracing::info!("Received {} push token: {}", self.provider, token);
        if let Err(e) = self.foreground.dispatch_token(token, self.provider) {
            tracing::error!("Could not forward refreshed {} token: {}", self.provider, e);
        }
    }

    /// Returns the id of the posted notification, if one was posted.
    pub fn on_message_received(&self, message: &RemoteMessage) -> Option<i32> {
        tracing::info!("Received {} push message {:?}", self.provider, message.message_id);

        if message.data.is_empty() {
            tracing::warn!("No data payload in the message");
            return None;
        }

        tracing::info!("Message data payload: {}", message.data);
        let (title, body) = self.content_mode.extract(&message.data);

        match self.notifier.render_notification(&title, &body) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to post notification: {}", e);
                None
            }
        }
    }
}
