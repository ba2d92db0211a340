//! Tokio event pump for the client.
//!
//! Provides [`Pump`], a single task that owns the [`Client`] and is the only
//! mutator of its mirror. Events arrive on an `mpsc` channel; commands and
//! notifications leave on channels; a [`MirrorSnapshot`] is published on a
//! `watch` channel after every event has been fully processed, so readers
//! never observe a half-applied message.

use relaymirror_core::{ColorStrip, DiagnosticSink, MirrorSnapshot, Notification};
use relaymirror_proto::Command;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{Client, ClientAction, ClientEvent};

/// Caller side of a [`Pump`].
#[derive(Debug)]
pub struct PumpHandles {
    /// Feed events into the client.
    pub events: mpsc::Sender<ClientEvent>,
    /// Commands to write to the transport.
    pub commands: mpsc::UnboundedReceiver<Command>,
    /// Mirror change notifications.
    pub notifications: mpsc::UnboundedReceiver<Notification>,
    /// Latest fully reconciled mirror state.
    pub snapshots: watch::Receiver<MirrorSnapshot>,
}

/// Owns a [`Client`] and drives it from a channel.
#[derive(Debug)]
pub struct Pump<S, D> {
    client: Client<S>,
    sink: D,
    events: mpsc::Receiver<ClientEvent>,
    commands: mpsc::UnboundedSender<Command>,
    notifications: mpsc::UnboundedSender<Notification>,
    snapshots: watch::Sender<MirrorSnapshot>,
}

impl<S: ColorStrip, D: DiagnosticSink> Pump<S, D> {
    /// Wrap `client`, sending diagnostic records to `sink`.
    ///
    /// `capacity` bounds the inbound event queue.
    pub fn new(client: Client<S>, sink: D, capacity: usize) -> (Self, PumpHandles) {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(client.mirror().snapshot());

        let pump = Self {
            client,
            sink,
            events: events_rx,
            commands: commands_tx,
            notifications: notifications_tx,
            snapshots: snapshots_tx,
        };
        let handles = PumpHandles {
            events: events_tx,
            commands: commands_rx,
            notifications: notifications_rx,
            snapshots: snapshots_rx,
        };
        (pump, handles)
    }

    /// Process events until every event sender is dropped, then hand the
    /// client back.
    pub async fn run(mut self) -> Client<S> {
        while let Some(event) = self.events.recv().await {
            self.step(event);
        }
        tracing::debug!("event channel closed, pump stopping");
        self.client
    }

    /// Run on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<Client<S>>
    where
        S: Send + 'static,
        D: Send + 'static,
    {
        tokio::spawn(self.run())
    }

    fn step(&mut self, event: ClientEvent) {
        match self.client.handle(event) {
            Ok(actions) => {
                for action in actions {
                    self.dispatch(action);
                }
            },
            Err(err) => tracing::warn!(error = %err, "event rejected"),
        }
        self.snapshots.send_replace(self.client.mirror().snapshot());
    }

    fn dispatch(&mut self, action: ClientAction) {
        match action {
            ClientAction::SessionStarted(session) => tracing::debug!(%session, "pump: session started"),
            ClientAction::Send(command) => {
                if self.commands.send(command).is_err() {
                    tracing::debug!("command receiver closed");
                }
            },
            ClientAction::Notify(notification) => {
                if self.notifications.send(notification).is_err() {
                    tracing::debug!("notification receiver closed");
                }
            },
            ClientAction::Diagnostic(record) => self.sink.record(record),
            ClientAction::MessageRejected { id, reason } => {
                tracing::warn!(%id, %reason, "message rejected");
            },
        }
    }
}
