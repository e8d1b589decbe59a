// ── Reply listeners ──
//
// One-shot reply slots keyed by the numeric value of a sequence code.
// Shared between the sending side and the receive task.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CoreError;
use crate::queue::{Ack, ReplySender};

#[derive(Debug)]
struct Listener {
    registered_at: Instant,
    reply: ReplySender,
}

/// Pending reply listeners.
#[derive(Debug, Default)]
pub struct ListenerMap {
    inner: DashMap<String, Listener>,
}

/// Listener key for a sequence number: the value without zero padding.
pub fn listener_key(sequence: u64) -> String {
    sequence.to_string()
}

impl ListenerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return how many were pending before it.
    pub fn register(&self, key: String, reply: ReplySender) -> usize {
        let pending = self.inner.len();
        self.inner.insert(
            key,
            Listener {
                registered_at: Instant::now(),
                reply,
            },
        );
        pending
    }

    /// Hand `content` to the listener for `key`, removing it.
    /// Returns `false` when no listener was waiting.
    pub fn resolve(&self, key: &str, content: String) -> bool {
        match self.inner.remove(key) {
            Some((_, listener)) => {
                let _ = listener.reply.send(Ok(Ack::Replied(content)));
                true
            }
            None => false,
        }
    }

    /// Remove the listener for `key` and fail it with `err`.
    pub fn fail(&self, key: &str, err: CoreError) -> bool {
        match self.inner.remove(key) {
            Some((_, listener)) => {
                let _ = listener.reply.send(Err(err));
                true
            }
            None => false,
        }
    }

    /// Drop listeners registered more than `ttl` ago; their callers get
    /// `ReplyTimeout`. Returns the number evicted.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .inner
            .iter()
            .filter(|entry| now.duration_since(entry.registered_at) >= ttl)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for key in expired {
            // Re-check under the shard lock: a reply may have arrived since.
            if let Some((code, listener)) = self
                .inner
                .remove_if(&key, |_, l| now.duration_since(l.registered_at) >= ttl)
            {
                debug!(code = %code, "reply listener expired");
                let _ = listener.reply.send(Err(CoreError::ReplyTimeout {
                    code,
                    ttl_secs: ttl.as_secs(),
                }));
                evicted += 1;
            }
        }
        evicted
    }

    /// Fail every pending listener with `HubClosed`.
    pub fn close(&self) -> usize {
        let keys: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for key in keys {
            if let Some((_, listener)) = self.inner.remove(&key) {
                let _ = listener.reply.send(Err(CoreError::HubClosed));
                closed += 1;
            }
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
