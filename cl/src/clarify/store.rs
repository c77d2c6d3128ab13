//! SessionStore - in-memory session registry with per-session locking
//!
//! The map lock is held only long enough to look up or insert an entry.
//! Each session sits behind its own async mutex, so a round (which awaits
//! collaborator calls) serializes requests for that session without blocking
//! any other session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::types::Session;

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session and return it already locked
    ///
    /// The lock is taken before the entry becomes visible, so no other
    /// request can act on the session until the caller releases it.
    /// Returns `None` if the id is taken.
    pub async fn insert_locked(&self, session: Session) -> Option<OwnedMutexGuard<Session>> {
        let id = session.id().to_string();
        debug!(session_id = %id, "insert_locked: called");

        let handle = Arc::new(Mutex::new(session));
        let guard = handle.clone().lock_owned().await;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            debug!(session_id = %id, "insert_locked: id already present");
            return None;
        }
        sessions.insert(id, handle);
        Some(guard)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn remove(&self, id: &str) -> Option<SessionHandle> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            debug!(session_id = %id, "remove: session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions untouched for longer than `ttl`
    ///
    /// Sessions currently locked by a request are skipped. Returns the number
    /// of sessions removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        if ttl < Duration::zero() {
            warn!(ttl_secs = ttl.num_seconds(), "evict_idle: negative ttl, skipping sweep");
            return 0;
        }
        // Nothing can be idle longer than the representable past
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            debug!(ttl_secs = ttl.num_seconds(), "evict_idle: ttl exceeds representable range");
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) => {
                let keep = session.updated_at() > cutoff;
                if !keep {
                    debug!(session_id = %id, status = %session.status(), "evict_idle: evicting");
                }
                keep
            }
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "evict_idle: evicted idle sessions");
        }
        evicted
    }
}
