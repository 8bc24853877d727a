//! The signed-in session, passed explicitly to whatever needs to authenticate.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// An access token and the moment it stops being valid. No expiry means "until sign out".
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expiry: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: &str, expiry: Option<DateTime<Utc>>) -> Session {
        Session {
            token: token.to_string(),
            expiry,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expiry.map(|e| now < e).unwrap_or(true)
    }
}

pub type SubscriberId = usize;

type Subscriber = Box<dyn Fn(Option<&Session>) + Send>;

/// Holds the current session and tells subscribers when it changes.
#[derive(Default)]
pub struct SessionContext {
    current: Option<Session>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_id: SubscriberId,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("signed_in", &self.current.is_some())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SessionContext {
    pub fn new() -> SessionContext {
        SessionContext::default()
    }

    pub fn with_session(session: Session) -> SessionContext {
        SessionContext {
            current: Some(session),
            ..SessionContext::default()
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The token to send, if the session has not expired at `now`.
    pub fn token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|s| s.is_live(now))
            .map(|s| s.token.as_str())
    }

    pub fn sign_in(&mut self, session: Session) {
        info!("session: signed in (expiry: {:?})", session.expiry);
        self.current = Some(session);
        self.notify();
    }

    pub fn sign_out(&mut self) {
        if self.current.take().is_some() {
            info!("session: signed out");
            self.notify();
        }
    }

    /// Registers a callback, called with the new session (or `None`) after every change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: Fn(Option<&Session>) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    fn notify(&self) {
        debug!("session: notifying {} subscribers", self.subscribers.len());
        for (_, callback) in self.subscribers.iter() {
            callback(self.current.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[test]
    fn expiry() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let later = Utc.timestamp_opt(1_700_003_600, 0).unwrap();
        let ctx = SessionContext::with_session(Session::new("abc", Some(later)));
        assert_eq!(ctx.token_at(now), Some("abc"));
        assert_eq!(ctx.token_at(later), None);
        assert_eq!(
            SessionContext::with_session(Session::new("abc", None)).token_at(later),
            Some("abc")
        );
        assert_eq!(SessionContext::new().token_at(now), None);
    }

    #[test]
    fn subscribers_see_changes() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = SessionContext::new();
        let seen2 = seen.clone();
        let id = ctx.subscribe(move |s| {
            seen2.lock().unwrap().push(s.map(|s| s.token.clone()));
        });
        ctx.sign_in(Session::new("t1", None));
        ctx.sign_out();
        // Signing out twice does not notify twice.
        ctx.sign_out();
        assert!(ctx.unsubscribe(id));
        ctx.sign_in(Session::new("t2", None));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("t1".to_string()), None]
        );
        assert!(!ctx.unsubscribe(id));
    }
}
