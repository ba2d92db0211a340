//! Observable state snapshots for invariant checking.
//!
//! Invariants run against a snapshot rather than the live client so that a
//! check always sees one consistent, fully reconciled state.

use relaymirror_client::{Client, SessionId};
use relaymirror_core::{ColorStrip, MirrorSnapshot};

/// Snapshot of one client's observable state.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Mirror contents and routes.
    pub mirror: MirrorSnapshot,
    /// Every session id observed so far, in observation order.
    pub session_history: Vec<SessionId>,
    /// Configured per-buffer line cap.
    pub line_cap: Option<usize>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no buffers, unroutable).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of a live client.
    pub fn from_client<S: ColorStrip>(client: &Client<S>, line_cap: Option<usize>) -> Self {
        Self {
            mirror: client.mirror().snapshot(),
            session_history: client.session().into_iter().collect(),
            line_cap,
        }
    }

    /// Record a session observation for monotonicity checks.
    pub fn record_session(&mut self, session: SessionId) {
        self.session_history.push(session);
    }

    /// Builder-style session history.
    #[must_use]
    pub fn with_sessions(mut self, sessions: impl IntoIterator<Item = SessionId>) -> Self {
        self.session_history.extend(sessions);
        self
    }
}
