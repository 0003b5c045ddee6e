//! User-facing failure notifications.
//!
//! Notifiers are fire-and-forget: the store never waits on them and never
//! learns whether a message was shown.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receives human-readable failure messages.
pub trait Notifier: Send + Sync {
    fn report_error(&self, message: &str);
}

/// Emits each message as a `WARN` tracing event on the `cartsync::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_error(&self, message: &str) {
        tracing::warn!(target: "cartsync::notify", %message, "Cart error reported to user");
    }
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages reported so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// Remove and return every message reported so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn report_error(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}
