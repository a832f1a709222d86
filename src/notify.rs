//! Notification sink, session identity and presence count

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::NOTIFICATION_LIFETIME_MS;
use crate::pixel::ANONYMOUS;

/// Fire-and-forget user-facing messages; `now` is epoch ms on the caller's clock
pub trait Notifier {
    fn notify(&self, message: &str, details: Option<&str>, now: u64);
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, details: Option<&str>, _now: u64) {
        match details {
            Some(details) => log::warn!("{}: {}", message, details),
            None => log::warn!("{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub details: Option<String>,
    /// Epoch ms when raised
    pub timestamp: u64,
}

#[derive(Debug, Default)]
struct CenterState {
    next_id: u64,
    items: VecDeque<Notification>,
}

/// Queue of visible notifications; each expires after a fixed lifetime.
/// Clones share the same queue.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<CenterState>>,
    lifetime_ms: u64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NOTIFICATION_LIFETIME_MS)
    }
}

impl NotificationCenter {
    pub fn new(lifetime_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CenterState::default())),
            lifetime_ms,
        }
    }

    fn state(&self) -> MutexGuard<'_, CenterState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_at(&self, message: &str, details: Option<&str>, now: u64) -> u64 {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.items.push_back(Notification {
            id,
            message: message.to_string(),
            details: details.map(str::to_string),
            timestamp: now,
        });
        id
    }

    /// Drop expired notifications; returns how many were removed
    pub fn prune(&self, now: u64) -> usize {
        let lifetime = self.lifetime_ms;
        let mut state = self.state();
        let before = state.items.len();
        state
            .items
            .retain(|n| now.saturating_sub(n.timestamp) < lifetime);
        before - state.items.len()
    }

    pub fn active(&self) -> Vec<Notification> {
        self.state().items.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.state().items.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, message: &str, details: Option<&str>, now: u64) {
        LogNotifier.notify(message, details, now);
        self.push_at(message, details, now);
    }
}

/// Identity of the local user; anonymous until someone signs in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn owner_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// Online-session counter fed by the presence stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    count: u32,
}

impl Presence {
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Full resync with the authoritative count
    pub fn sync(&mut self, count: u32) {
        self.count = count;
    }

    pub fn join(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn leave(&mut self) {
        self.count = self.count.saturating_sub(1);
    }
}
