//! Wrap-up Timer Manager.
//!
//! Each wrap-up entry moves `NONE → PENDING → COMPLETED`. The manager holds
//! only the bookkeeping: the engine spawns the timer task and hands the
//! manager its `AbortHandle`. The entry lives inside the engine state, so
//! firing and cancelling both remove it under the same lock and exactly one
//! of them wins.

use std::collections::HashMap;

use tokio::{task::AbortHandle, time::Instant};
use tracing::debug;

use callsim_contracts::call::CallId;

#[derive(Debug)]
struct WrapupEntry {
    token: u64,
    deadline: Instant,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
pub struct WrapupManager {
    entries: HashMap<CallId, WrapupEntry>,
    next_token: u64,
}

impl WrapupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending wrap-up for `call_id` and start its timer.
    ///
    /// `spawn` receives the entry's token and must return the handle of the
    /// task that will call [`complete`](Self::complete) with that token.
    /// Returns `false` without calling `spawn` if a wrap-up for `call_id` is
    /// already pending.
    pub fn schedule<F>(&mut self, call_id: CallId, deadline: Instant, spawn: F) -> bool
    where
        F: FnOnce(u64) -> AbortHandle,
    {
        if self.entries.contains_key(&call_id) {
            debug!(call_id = %call_id, "wrap-up already pending");
            return false;
        }

        self.next_token += 1;
        let token = self.next_token;
        let handle = spawn(token);
        self.entries.insert(call_id, WrapupEntry { token, deadline, handle });
        true
    }

    /// Mark the entry complete if it is still the one identified by `token`.
    ///
    /// Returns `true` exactly once per scheduled entry, and never for an
    /// entry that was cancelled first.
    pub fn complete(&mut self, call_id: &CallId, token: u64) -> bool {
        match self.entries.get(call_id) {
            Some(entry) if entry.token == token => {
                self.entries.remove(call_id);
                true
            }
            _ => false,
        }
    }

    /// Remove and abort every pending entry, returning the affected ids.
    pub fn cancel_all(&mut self) -> Vec<CallId> {
        self.entries
            .drain()
            .map(|(call_id, entry)| {
                entry.handle.abort();
                call_id
            })
            .collect()
    }

    pub fn is_pending(&self, call_id: &CallId) -> bool {
        self.entries.contains_key(call_id)
    }

    /// When the pending wrap-up for `call_id` is due, if one exists.
    pub fn deadline(&self, call_id: &CallId) -> Option<Instant> {
        self.entries.get(call_id).map(|entry| entry.deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
