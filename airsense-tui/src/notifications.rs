//! Footer notifications.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
            NotificationLevel::Success => "OK",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the notification is older than `ttl` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Bounded queue of notifications; the newest is shown.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    const CAPACITY: usize = 32;

    pub fn push(&mut self, notification: Notification) {
        if self.items.len() == Self::CAPACITY {
            self.items.remove(0);
        }
        self.items.push(notification);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    /// Drop notifications older than `ttl`; errors stay until dismissed.
    pub fn expire(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.items
            .retain(|n| n.level == NotificationLevel::Error || !n.is_stale(now, ttl));
    }

    pub fn dismiss(&mut self) {
        self.items.pop();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_keeps_errors() {
        let mut notes = Notifications::default();
        notes.push(Notification::new(NotificationLevel::Info, "loaded"));
        notes.push(Notification::new(NotificationLevel::Error, "offline"));

        let later = Utc::now() + Duration::seconds(30);
        notes.expire(later, Duration::seconds(5));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.latest().map(|n| n.message.as_str()), Some("offline"));

        notes.dismiss();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut notes = Notifications::default();
        for i in 0..40 {
            notes.push(Notification::new(NotificationLevel::Info, format!("n{}", i)));
        }
        assert_eq!(notes.len(), Notifications::CAPACITY);
        assert_eq!(notes.latest().map(|n| n.message.as_str()), Some("n39"));
    }
}
