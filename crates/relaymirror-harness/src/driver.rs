//! Real-client driver.
//!
//! Translates model [`Operation`]s into [`ClientEvent`]s for a real
//! [`Client`], tracks the live session the way a transport would, and
//! classifies the resulting actions into an [`OperationResult`].

use relaymirror_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, SessionId,
};
use relaymirror_core::Notification;
use relaymirror_proto::{Message, Object};

use crate::{
    fixtures::{self, BufferRow, LineRow, NickRow, pointer_for},
    invariants::SystemSnapshot,
    model::{
        ObservableBuffer, ObservableState, Operation, OperationError, OperationResult, full_name,
        line_text, nick_name,
    },
};

/// Real client wrapper that mirrors [`crate::ModelWorld`]'s interface.
#[derive(Debug)]
pub struct Driver {
    client: Client,
    live: Option<SessionId>,
    last: SessionId,
    sessions: Vec<SessionId>,
    line_cap: Option<usize>,
}

impl Driver {
    /// Driver around a fresh client.
    pub fn new(config: ClientConfig) -> Self {
        let line_cap = config.reconciler.max_lines_per_buffer;
        Self {
            client: Client::new(config),
            live: None,
            last: SessionId(0),
            sessions: Vec::new(),
            line_cap,
        }
    }

    /// The wrapped client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Apply an operation to the real client.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        tracing::trace!(?op, live = ?self.live, "driver operation");
        let event = match op {
            Operation::Connect => ClientEvent::Connected,
            Operation::Disconnect => ClientEvent::Disconnected { session: self.last },
            Operation::Input { slot } => {
                ClientEvent::SendInput { buffer: pointer_for(*slot), text: "hello".into() }
            },
            Operation::StaleLine { slot } => ClientEvent::MessageReceived {
                session: SessionId(self.last.0.saturating_sub(1)),
                message: fixtures::line(pointer_for(*slot), 0, "stale"),
            },
            other => ClientEvent::MessageReceived {
                session: self.live.unwrap_or(self.last),
                message: message_for(other),
            },
        };

        let stale_before = self.client.stats().stale_messages;
        let result = self.client.handle(event);
        let stale = self.client.stats().stale_messages > stale_before;

        match result {
            Ok(actions) => self.classify(&actions, stale),
            Err(ClientError::NotConnected { .. }) => {
                OperationResult::Error(OperationError::NotConnected)
            },
            Err(ClientError::UnknownBuffer { .. }) => {
                OperationResult::Error(OperationError::UnknownBuffer)
            },
            Err(ClientError::AlreadyConnected { .. }) => {
                OperationResult::Error(OperationError::AlreadyConnected)
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let mirror = self.client.mirror();
        ObservableState {
            routable: mirror.is_routable(),
            buffers: mirror
                .buffers()
                .iter()
                .map(|b| ObservableBuffer {
                    pointer: b.pointer().to_string(),
                    number: b.summary.number,
                    full_name: b.summary.full_name.clone(),
                    lines: b.lines.iter().map(|l| l.text.clone()).collect(),
                    nicks: b.nicks.iter().map(|n| n.name.clone()).collect(),
                })
                .collect(),
        }
    }

    /// Snapshot for invariant checks, with every session seen so far.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            mirror: self.client.mirror().snapshot(),
            session_history: self.sessions.clone(),
            line_cap: self.line_cap,
        }
    }

    fn classify(&mut self, actions: &[ClientAction], stale: bool) -> OperationResult {
        let mut result = OperationResult::Ok;
        for action in actions {
            match action {
                ClientAction::SessionStarted(session) => {
                    self.live = Some(*session);
                    self.last = *session;
                    self.sessions.push(*session);
                },
                ClientAction::Notify(Notification::MirrorInvalidated { .. }) => self.live = None,
                ClientAction::Notify(Notification::DroppedUpdate { .. }) => {
                    result = OperationResult::Dropped;
                },
                ClientAction::MessageRejected { id, reason } => {
                    tracing::debug!(%id, %reason, "driver saw rejection");
                    result = OperationResult::Rejected;
                },
                _ => {},
            }
        }
        if stale {
            tracing::debug!(last = %self.last, "driver saw stale message");
            OperationResult::Stale
        } else {
            result
        }
    }
}

fn message_for(op: &Operation) -> Message {
    match op {
        Operation::Resync { rows } => fixtures::buffer_list(
            &rows
                .iter()
                .map(|row| BufferRow::new(pointer_for(row.slot), i32::from(row.number), full_name(row.slot)))
                .collect::<Vec<_>>(),
        ),
        Operation::Line { slot, seed } => fixtures::line(pointer_for(*slot), 0, &line_text(*seed)),
        Operation::LiveLine { slot, seed } => fixtures::live_line(&LineRow {
            owner: pointer_for(*slot),
            date: 0,
            prefix: String::new(),
            text: line_text(*seed),
        }),
        Operation::Nick { slot, group, visible, seed } => fixtures::nicklist(&[NickRow {
            owner: pointer_for(*slot),
            group: *group,
            visible: *visible,
            prefix: String::new(),
            name: nick_name(*seed),
        }]),
        Operation::Debug { slot } => fixtures::as_debug(fixtures::buffer_list(&[BufferRow::new(
            pointer_for(*slot),
            1,
            full_name(*slot),
        )])),
        Operation::Malformed { slot } => {
            let mut message = fixtures::line(pointer_for(*slot), 0, "broken");
            if let Some(Object::Hdata(hdata)) = message.objects.first_mut() {
                for item in &mut hdata.items {
                    item.fields.remove("date");
                }
            }
            message
        },
        Operation::Connect
        | Operation::Disconnect
        | Operation::StaleLine { .. }
        | Operation::Input { .. } => Message::new("", Vec::new()),
    }
}
