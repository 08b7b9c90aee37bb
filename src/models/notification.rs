// src/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum platform API level that requires notification channels.
pub const CHANNEL_MIN_API_LEVEL: u32 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelImportance {
    Low,
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

impl NotificationChannel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            importance: ChannelImportance::Default,
        }
    }
}

/// A local notification ready to be posted to the OS surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub auto_cancel: bool,
    pub posted_at: DateTime<Utc>,
}
