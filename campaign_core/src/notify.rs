//! User-facing messages, queued and handed to a renderer.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// How long a message stays on screen unless dismissed.
    pub fn default_ttl(&self) -> Duration {
        match self {
            NoticeKind::Info | NoticeKind::Success => Duration::from_secs(4),
            NoticeKind::Warning => Duration::from_secs(6),
            NoticeKind::Error => Duration::from_secs(10),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
    pub ttl: Duration,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.created_at).to_std() {
            Ok(age) => age >= self.ttl,
            // `now` is before the creation time.
            Err(_) => false,
        }
    }
}

/// Displays notifications. The queue calls it once per notification.
pub trait NoticeRenderer {
    fn render(&mut self, notification: &Notification);
}

/// An append-only list of notifications.
///
/// Dismissing a notification hides it without removing it from the list.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    dismissed: HashSet<u64>,
    rendered: usize,
}

impl NotificationQueue {
    pub fn new() -> NotificationQueue {
        NotificationQueue::default()
    }

    pub fn push(&mut self, kind: NoticeKind, message: &str, now: DateTime<Utc>) -> u64 {
        self.push_with_ttl(kind, message, kind.default_ttl(), now)
    }

    pub fn push_with_ttl(
        &mut self,
        kind: NoticeKind,
        message: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> u64 {
        let id = self.items.len() as u64 + 1;
        debug!("notification {} ({:?}): {}", id, kind, message);
        self.items.push(Notification {
            id,
            message: message.to_string(),
            kind,
            ttl,
            created_at: now,
        });
        id
    }

    pub fn error<E: Display>(&mut self, err: &E, now: DateTime<Utc>) -> u64 {
        self.push(NoticeKind::Error, &err.to_string(), now)
    }

    pub fn dismiss(&mut self, id: u64) {
        self.dismissed.insert(id);
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    /// Notifications still on screen at `now`.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<&Notification> {
        self.items
            .iter()
            .filter(|n| !self.dismissed.contains(&n.id) && !n.is_expired(now))
            .collect()
    }

    /// Hands every notification added since the last call to the renderer, in order.
    pub fn flush<R: NoticeRenderer + ?Sized>(&mut self, renderer: &mut R) -> usize {
        let fresh = &self.items[self.rendered..];
        for n in fresh.iter().filter(|n| !self.dismissed.contains(&n.id)) {
            renderer.render(n);
        }
        let count = fresh.len();
        self.rendered = self.items.len();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl NoticeRenderer for Collect {
        fn render(&mut self, n: &Notification) {
            self.0.push(format!("{:?}:{}", n.kind, n.message));
        }
    }

    #[test]
    fn ttl_and_dismiss() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut q = NotificationQueue::new();
        let a = q.push(NoticeKind::Info, "saved", t0);
        let b = q.push(NoticeKind::Error, "Turf 3 not found.", t0);
        let c = q.push_with_ttl(NoticeKind::Warning, "slow", Duration::from_secs(60), t0);
        assert_eq!((a, b, c), (1, 2, 3));

        let t5 = Utc.timestamp_opt(1_700_000_005, 0).unwrap();
        let ids: Vec<u64> = q.visible(t5).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3]);

        q.dismiss(2);
        let ids: Vec<u64> = q.visible(t5).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(q.all().len(), 3);
    }

    #[test]
    fn flush_renders_once() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut q = NotificationQueue::new();
        let mut out = Collect::default();
        q.push(NoticeKind::Success, "Imported 2 voters", t0);
        assert_eq!(q.flush(&mut out), 1);
        assert_eq!(q.flush(&mut out), 0);
        q.error(&"boom", t0);
        q.flush(&mut out);
        assert_eq!(out.0, vec!["Success:Imported 2 voters", "Error:boom"]);
    }
}
