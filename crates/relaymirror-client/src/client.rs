//! Client state machine.
//!
//! The `Client` owns the buffer mirror and the reconciler and ties them to a
//! connection lifecycle. Every connect starts a fresh session with a full
//! resync; every disconnect invalidates routing in one step so that nothing
//! from the old session can land in the mirror afterwards.

use relaymirror_core::{
    BufferMirror, ColorStrip, DiagnosticRecord, MessageKind, Notification, ReconcileStats,
    Reconciler, ReconcilerConfig, Verbatim,
};
use relaymirror_proto::{Command, Message, Pointer};

use crate::{
    error::ClientError,
    event::{ClientAction, ClientEvent, SessionId},
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Reconciler configuration. Its request ids also tag the resync requests.
    pub reconciler: ReconcilerConfig,
    /// Drop every buffer on disconnect instead of only invalidating routing.
    pub clear_on_disconnect: bool,
    /// Echo every inbound message to the debug console, not only debug
    /// replies.
    pub echo_all: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { reconciler: ReconcilerConfig::default(), clear_on_disconnect: true, echo_all: false }
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport.
    Disconnected,
    /// Transport is connecting.
    Connecting,
    /// Live session.
    Connected {
        /// Current session.
        session: SessionId,
    },
}

/// Session-level counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientStats {
    /// Sessions started.
    pub sessions: u64,
    /// Messages handed to the reconciler.
    pub messages: u64,
    /// Messages discarded because their session was not the live one.
    pub stale_messages: u64,
    /// Commands emitted.
    pub commands_sent: u64,
}

/// Relay client: mirror plus session lifecycle.
#[derive(Debug)]
pub struct Client<S = Verbatim> {
    config: ClientConfig,
    state: ConnectionState,
    last_session: u64,
    mirror: BufferMirror,
    reconciler: Reconciler<S>,
    stats: ClientStats,
}

impl Client<Verbatim> {
    /// Create a disconnected client that keeps text verbatim.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_strip(config, Verbatim)
    }
}

impl<S: ColorStrip> Client<S> {
    /// Create a disconnected client stripping colors with `strip`.
    pub fn with_strip(config: ClientConfig, strip: S) -> Self {
        let reconciler = Reconciler::with_strip(config.reconciler.clone(), strip);
        Self {
            config,
            state: ConnectionState::Disconnected,
            last_session: 0,
            mirror: BufferMirror::new(),
            reconciler,
            stats: ClientStats::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Live session, if connected.
    pub fn session(&self) -> Option<SessionId> {
        match self.state {
            ConnectionState::Connected { session } => Some(session),
            _ => None,
        }
    }

    /// Read-only view of the mirror.
    pub fn mirror(&self) -> &BufferMirror {
        &self.mirror
    }

    /// Session-level counters.
    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Reconciler counters.
    pub fn reconcile_stats(&self) -> ReconcileStats {
        self.reconciler.stats()
    }

    /// Process an event and return actions for the caller to execute.
    ///
    /// # Errors
    ///
    /// - `ClientError::NotConnected` for user intents without a live session
    /// - `ClientError::AlreadyConnected` for `Connecting` during a session
    /// - `ClientError::UnknownBuffer` for input to an unroutable buffer
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Connecting => self.handle_connecting(),
            ClientEvent::Connected => Ok(self.handle_connected()),
            ClientEvent::MessageReceived { session, message } => {
                Ok(self.handle_message(session, &message))
            },
            ClientEvent::Disconnected { session } => Ok(self.handle_disconnected(session)),
            ClientEvent::SendInput { buffer, text } => self.handle_input(&buffer, text),
            ClientEvent::SendDebug { text } => {
                self.require_session("send debug command")?;
                let mut actions = Vec::new();
                self.send(&mut actions, Command::debug_console(&text));
                Ok(actions)
            },
            ClientEvent::RequestResync => {
                self.require_session("resync")?;
                let mut actions = Vec::new();
                self.send_resync(&mut actions);
                Ok(actions)
            },
        }
    }

    fn handle_connecting(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if let ConnectionState::Connected { session } = self.state {
            return Err(ClientError::AlreadyConnected { session });
        }
        self.state = ConnectionState::Connecting;
        Ok(vec![ClientAction::Diagnostic(DiagnosticRecord::status("connecting"))])
    }

    fn handle_connected(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        // A connect without a prior disconnect still ends the old session.
        if let ConnectionState::Connected { session } = self.state {
            actions.extend(self.end_session(session));
        }

        self.last_session += 1;
        let session = SessionId(self.last_session);
        self.state = ConnectionState::Connected { session };
        self.stats.sessions += 1;
        tracing::info!(%session, "session started");

        actions.push(ClientAction::SessionStarted(session));
        actions.push(ClientAction::Diagnostic(DiagnosticRecord::status("connected")));
        self.send_resync(&mut actions);
        actions
    }

    fn handle_message(&mut self, session: SessionId, message: &Message) -> Vec<ClientAction> {
        if self.session() != Some(session) {
            self.stats.stale_messages += 1;
            tracing::debug!(%session, id = %message.id, "stale message discarded");
            return Vec::new();
        }
        self.stats.messages += 1;

        let mut actions = Vec::new();
        let kind = self.reconciler.classifier().classify(message);
        if kind == MessageKind::Diagnostic || self.config.echo_all {
            actions.push(ClientAction::Diagnostic(DiagnosticRecord::inbound(message)));
        }

        match self.reconciler.apply(&mut self.mirror, message) {
            Ok(outcome) => {
                actions.extend(outcome.notifications.into_iter().map(ClientAction::Notify));
            },
            Err(err) => actions.push(ClientAction::MessageRejected {
                id: message.id.clone(),
                reason: err.to_string(),
            }),
        }
        actions
    }

    fn handle_disconnected(&mut self, session: SessionId) -> Vec<ClientAction> {
        match self.state {
            ConnectionState::Connected { session: live } if live == session => self.end_session(session),
            ConnectionState::Connecting => {
                self.state = ConnectionState::Disconnected;
                vec![ClientAction::Diagnostic(DiagnosticRecord::status("connection failed"))]
            },
            _ => {
                tracing::debug!(%session, "disconnect for stale session ignored");
                Vec::new()
            },
        }
    }

    fn handle_input(&mut self, buffer: &Pointer, text: String) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session("send input")?;
        let full_name = self
            .mirror
            .get(buffer)
            .map(|b| b.summary.full_name.clone())
            .ok_or_else(|| ClientError::UnknownBuffer { pointer: buffer.clone() })?;

        let mut actions = Vec::new();
        self.send(&mut actions, Command::Input { buffer: full_name, text });
        Ok(actions)
    }

    fn end_session(&mut self, session: SessionId) -> Vec<ClientAction> {
        let cleared = self.config.clear_on_disconnect;
        self.mirror.invalidate(cleared);
        self.state = ConnectionState::Disconnected;
        tracing::info!(%session, cleared, "session ended");

        vec![
            ClientAction::Notify(Notification::MirrorInvalidated { cleared }),
            ClientAction::Diagnostic(DiagnosticRecord::status("disconnected")),
        ]
    }

    fn require_session(&self, operation: &'static str) -> Result<SessionId, ClientError> {
        self.session().ok_or(ClientError::NotConnected { operation })
    }

    fn send_resync(&mut self, actions: &mut Vec<ClientAction>) {
        let ids = &self.reconciler.classifier().config().request_ids;
        for command in Command::resync_requests(ids) {
            self.send(actions, command);
        }
    }

    fn send(&mut self, actions: &mut Vec<ClientAction>, command: Command) {
        self.stats.commands_sent += 1;
        actions.push(ClientAction::Diagnostic(DiagnosticRecord::outbound(&command)));
        actions.push(ClientAction::Send(command));
    }
}
