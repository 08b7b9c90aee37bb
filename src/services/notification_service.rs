// src/services/notification_service.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{
    atomic::{AtomicI32, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tracing;

use crate::{
    errors::{PushError, PushResult},
    models::{Notification, NotificationChannel, CHANNEL_MIN_API_LEVEL},
};

/// The OS notification manager.
pub trait NotificationSurface: Send + Sync {
    fn api_level(&self) -> u32;
    /// Creates the channel, or leaves an existing one with the same id alone.
    fn create_channel(&self, channel: &NotificationChannel) -> PushResult<()>;
    /// Posting with an id that is already showing replaces it.
    fn notify(&self, notification: Notification) -> PushResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationIdPolicy {
    /// Every notification reuses one id, so each post replaces the last.
    Fixed(i32),
    /// Ids count up from zero, so notifications stack.
    Sequential,
}

impl Default for NotificationIdPolicy {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

/// Builds and posts local notifications on a single channel.
pub struct LocalNotifier {
    surface: Arc<dyn NotificationSurface>,
    channel: NotificationChannel,
    id_policy: NotificationIdPolicy,
    next_id: AtomicI32,
}

impl LocalNotifier {
    pub fn new(
        surface: Arc<dyn NotificationSurface>,
        channel: NotificationChannel,
        id_policy: NotificationIdPolicy,
    ) -> Self {
        Self {
            surface,
            channel,
            id_policy,
            next_id: AtomicI32::new(0),
        }
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    /// Posts a notification and returns the id it was posted under.
    pub fn render_notification(&self, title: &str, body: &str) -> PushResult<i32> {
        tracing::debug!("Sending notification: Title: {}, Body: {}", title, body);

        if self.surface.api_level() >= CHANNEL_MIN_API_LEVEL {
            self.surface.create_channel(&self.channel)?;
        }

        let id = self.next_notification_id();
        self.surface.notify(Notification {
            id,
            channel_id: self.channel.id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            auto_cancel: true,
            posted_at: Utc::now(),
        })?;

        Ok(id)
    }

    fn next_notification_id(&self) -> i32 {
        match self.id_policy {
            NotificationIdPolicy::Fixed(id) => id,
            NotificationIdPolicy::Sequential => self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Notification surface kept in memory. Used by the demo binary and tests.
#[derive(Debug)]
pub struct InMemoryNotificationSurface {
    api_level: u32,
    channels: Mutex<HashMap<String, NotificationChannel>>,
    active: Mutex<BTreeMap<i32, Notification>>,
    post_count: AtomicUsize,
}

impl InMemoryNotificationSurface {
    pub fn new(api_level: u32) -> Self {
        Self {
            api_level,
            channels: Mutex::new(HashMap::new()),
            active: Mutex::new(BTreeMap::new()),
            post_count: AtomicUsize::new(0),
        }
    }

    /// Notifications currently showing, ordered by id.
    pub fn active(&self) -> Vec<Notification> {
        self.active
            .lock()
            .map(|active| active.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.channels
            .lock()
            .map(|channels| channels.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total posts, including ones that replaced an earlier notification.
    pub fn post_count(&self) -> usize {
        self.post_count.load(Ordering::SeqCst)
    }
}

impl NotificationSurface for InMemoryNotificationSurface {
    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn create_channel(&self, channel: &NotificationChannel) -> PushResult<()> {
        let mut channels = self.channels
            .lock()
            .map_err(|_| PushError::notification("channel registry poisoned"))?;
        channels.entry(channel.id.clone()).or_insert_with(|| channel.clone());
        Ok(())
    }

    fn notify(&self, notification: Notification) -> PushResult<()> {
        let mut active = self.active
            .lock()
            .map_err(|_| PushError::notification("notification registry poisoned"))?;
        active.insert(notification.id, notification);
        self.post_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
