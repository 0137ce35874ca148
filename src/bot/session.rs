// src/bot/session.rs

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::bot::event::PrincipalId;

/// The tools a session can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    Scan,
    Ip,
    Info,
    Ports,
}

/// Per-user conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub language: String,
    /// The tool waiting for a free-text argument, if any. At most one.
    pub pending: Option<Tool>,
    /// A tool dispatch for this session has not finished yet.
    pub busy: bool,
}

/// All sessions, keyed by principal.
///
/// A session is created on first contact and kept for the lifetime of the process.
/// The lock is never held across an await point.
pub struct SessionStore {
    sessions: Mutex<HashMap<PrincipalId, Session>>,
    default_language: String,
}

impl SessionStore {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            default_language: default_language.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PrincipalId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<R>(&self, principal: PrincipalId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.lock();
        let session = sessions.entry(principal).or_insert_with(|| {
            debug!(principal, "Creating session.");
            Session {
                language: self.default_language.clone(),
                pending: None,
                busy: false,
            }
        });
        f(session)
    }

    pub fn language(&self, principal: PrincipalId) -> String {
        self.with_session(principal, |s| s.language.clone())
    }

    pub fn set_language(&self, principal: PrincipalId, language: &str) {
        self.with_session(principal, |s| s.language = language.to_string());
    }

    pub fn pending(&self, principal: PrincipalId) -> Option<Tool> {
        self.with_session(principal, |s| s.pending)
    }

    /// Records `tool` as awaiting input, replacing whatever was pending.
    pub fn set_pending(&self, principal: PrincipalId, tool: Tool) {
        self.with_session(principal, |s| s.pending = Some(tool));
    }

    pub fn clear_pending(&self, principal: PrincipalId) {
        self.with_session(principal, |s| s.pending = None);
    }

    /// Clears the pending action and returns what it was, in one step.
    pub fn take_pending(&self, principal: PrincipalId) -> Option<Tool> {
        self.with_session(principal, |s| s.pending.take())
    }

    /// Marks the session busy. Returns `None` if a dispatch is already outstanding.
    pub fn try_begin_dispatch(&self, principal: PrincipalId) -> Option<DispatchGuard<'_>> {
        let acquired = self.with_session(principal, |s| !std::mem::replace(&mut s.busy, true));
        acquired.then_some(DispatchGuard { store: self, principal })
    }

}

/// Clears the busy flag when dropped, on every exit path of a dispatch.
pub struct DispatchGuard<'a> {
    store: &'a SessionStore,
    principal: PrincipalId,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.store.with_session(self.principal, |s| s.busy = false);
    }
}
