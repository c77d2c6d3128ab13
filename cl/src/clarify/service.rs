//! Clarifier - session lifecycle facade used by the HTTP and console surfaces

use chrono::Duration;
use tracing::{debug, info, warn};

use super::error::{ClarifyError, ClarifyResult};
use super::locale::Locale;
use super::machine::{RoundOutcome, SessionStateMachine};
use super::store::SessionStore;
use super::types::Session;

/// Owns the session store and runs rounds against it
pub struct Clarifier {
    machine: SessionStateMachine,
    store: SessionStore,
    max_rounds: u32,
}

impl Clarifier {
    pub fn new(machine: SessionStateMachine, max_rounds: u32) -> Self {
        debug!(max_rounds, locale = ?machine.locale(), "Clarifier::new: called");
        Self {
            machine,
            store: SessionStore::new(),
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn locale(&self) -> Locale {
        self.machine.locale()
    }

    /// Open a session for `query` under `id` and run its first round
    pub async fn start(&self, id: &str, query: &str) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %id, "start: called");
        let id = require("session_id", id)?;
        let query = require("query", query)?;

        let mut session = self
            .store
            .insert_locked(Session::new(id, query, self.max_rounds))
            .await
            .ok_or_else(|| ClarifyError::SessionExists(id.to_string()))?;
        info!(session_id = %id, max_rounds = self.max_rounds, "start: session created");

        self.machine.start(&mut session).await
    }

    /// Answer the outstanding question of session `id` and run the next round
    pub async fn continue_session(&self, id: &str, answer: &str) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %id, "continue_session: called");
        let id = require("session_id", id)?;
        let handle = self.lookup(id).await?;
        let mut session = handle.lock().await;
        self.machine.continue_with(&mut session, answer).await
    }

    /// Close session `id` now with whatever has been answered
    pub async fn finish(&self, id: &str) -> ClarifyResult<RoundOutcome> {
        debug!(session_id = %id, "finish: called");
        let id = require("session_id", id)?;
        let handle = self.lookup(id).await?;
        let mut session = handle.lock().await;
        self.machine.finish(&mut session).await
    }

    /// Forget session `id`; returns whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.store.remove(id).await.is_some();
        if removed {
            info!(session_id = %id, "remove: session removed");
        }
        removed
    }

    /// Point-in-time copy of session `id`
    pub async fn snapshot(&self, id: &str) -> ClarifyResult<Session> {
        let handle = self.lookup(id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    /// Drop sessions idle for longer than `ttl`
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        self.store.evict_idle(ttl).await
    }

    async fn lookup(&self, id: &str) -> ClarifyResult<super::store::SessionHandle> {
        match self.store.get(id).await {
            Some(handle) => Ok(handle),
            None => {
                warn!(session_id = %id, "lookup: session not found");
                Err(ClarifyError::SessionNotFound(id.to_string()))
            }
        }
    }
}

fn require<'a>(field: &str, value: &'a str) -> ClarifyResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ClarifyError::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(trimmed)
    }
}
