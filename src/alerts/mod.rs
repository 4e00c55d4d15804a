//! User-facing notifications.
//!
//! Business code reports outcomes through a [`NotificationSink`] and never
//! decides how they are shown. Tones are signals only; playback belongs to
//! whoever consumes them.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::timer::TimerKind;

/// Severity of a message notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "Success"),
            NotificationLevel::Info => write!(f, "Info"),
            NotificationLevel::Error => write!(f, "Error"),
        }
    }
}

/// Something the presentation layer should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Toast-style message
    Message {
        level: NotificationLevel,
        text: String,
    },
    /// A short tone should play because a timer elapsed
    Tone { timer: TimerKind },
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Notification::Message {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Notification::Message {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notification::Message {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }

    pub fn level(&self) -> Option<NotificationLevel> {
        match self {
            Notification::Message { level, .. } => Some(*level),
            Notification::Tone { .. } => None,
        }
    }
}

/// Fire-and-forget channel for notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Fans notifications out to any number of subscribers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.tx.send(notification);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Message {
                level: NotificationLevel::Error,
                text,
            } => tracing::error!("{}", text),
            Notification::Message { level, text } => tracing::info!("{}: {}", level, text),
            Notification::Tone { timer } => tracing::info!("{} timer elapsed", timer),
        }
    }
}

/// Keeps every notification in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Messages received at `level`.
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.received()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Message { level: l, text } if l == level => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn tone_count(&self) -> usize {
        self.received()
            .iter()
            .filter(|n| matches!(n, Notification::Tone { .. }))
            .count()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}
