//! Capture replay.
//!
//! A capture is a CBOR sequence of [`ReplayEntry`] values: the lifecycle
//! events and decoded messages of one or more relay sessions, in arrival
//! order. Replaying feeds them through a [`Client`] driven by the tokio
//! [`Pump`], exactly as a live transport would, and reports what the mirror
//! ended up holding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use relaymirror_client::{
    Client, ClientConfig, ClientEvent, ClientStats, SessionId, runtime::Pump,
};
use relaymirror_core::{Notification, ReconcileStats, TracingDiagnostics};
use relaymirror_proto::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inbound event queue depth for the pump.
const EVENT_QUEUE: usize = 64;

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// Transport connected.
    Connected,
    /// Decoded message on the current connection.
    Message(Message),
    /// Transport closed.
    Disconnected,
}

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Capture file could not be read or written
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Capture stream is not a valid entry sequence
    #[error("entry {index}: {reason}")]
    Decode {
        /// Index of the first bad entry
        index: usize,
        /// Decoder message
        reason: String,
    },

    /// Entry could not be encoded
    #[error("encode failed: {0}")]
    Encode(String),

    /// Pump task failed
    #[error("replay task failed: {0}")]
    Task(String),
}

/// Replay configuration.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Client configuration.
    pub client: ClientConfig,
}

/// What the mirror held after a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Entries fed to the client.
    pub entries: usize,
    /// Buffers in the mirror.
    pub buffers: usize,
    /// Lines across all buffers.
    pub lines: usize,
    /// Nicks across all buffers.
    pub nicks: usize,
    /// Notifications emitted.
    pub notifications: usize,
    /// Commands the client would have sent.
    pub commands: usize,
    /// Session counters.
    pub client: ClientStats,
    /// Reconciler counters.
    pub reconcile: ReconcileStats,
}

/// Read every entry from a CBOR sequence.
///
/// # Errors
///
/// - `ReplayError::Decode` if an entry is truncated or malformed
pub fn read_capture(reader: impl Read) -> Result<Vec<ReplayEntry>, ReplayError> {
    let mut reader = BufReader::new(reader);
    let mut entries = Vec::new();
    loop {
        let index = entries.len();
        let at_end = reader
            .fill_buf()
            .map_err(|e| ReplayError::Decode { index, reason: e.to_string() })?
            .is_empty();
        if at_end {
            return Ok(entries);
        }
        let entry = ciborium::from_reader(&mut reader)
            .map_err(|e| ReplayError::Decode { index, reason: e.to_string() })?;
        entries.push(entry);
    }
}

/// Write entries as a CBOR sequence.
///
/// # Errors
///
/// - `ReplayError::Encode` if an entry cannot be written
pub fn write_capture(mut writer: impl Write, entries: &[ReplayEntry]) -> Result<(), ReplayError> {
    for entry in entries {
        ciborium::into_writer(entry, &mut writer).map_err(|e| ReplayError::Encode(e.to_string()))?;
    }
    writer.flush().map_err(|e| ReplayError::Encode(e.to_string()))
}

/// Read a capture file.
///
/// # Errors
///
/// - `ReplayError::Io` if the file cannot be opened
/// - `ReplayError::Decode` if its contents are not a valid capture
pub fn load_capture(path: &Path) -> Result<Vec<ReplayEntry>, ReplayError> {
    let file =
        File::open(path).map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    read_capture(file)
}

/// Write a capture file, replacing any existing one.
///
/// # Errors
///
/// - `ReplayError::Io` if the file cannot be created
/// - `ReplayError::Encode` if an entry cannot be written
pub fn save_capture(path: &Path, entries: &[ReplayEntry]) -> Result<(), ReplayError> {
    let file =
        File::create(path).map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    write_capture(io::BufWriter::new(file), entries)
}

/// Feed `entries` through a pumped client.
///
/// Sessions are numbered the way the client numbers them, so messages that
/// precede the first `Connected` (or follow a `Disconnected`) are stale and
/// discarded.
///
/// # Errors
///
/// - `ReplayError::Task` if the pump task panicked or was cancelled
pub async fn replay(
    entries: Vec<ReplayEntry>,
    config: ReplayConfig,
) -> Result<ReplaySummary, ReplayError> {
    let total = entries.len();
    let (pump, mut handles) = Pump::new(Client::new(config.client), TracingDiagnostics, EVENT_QUEUE);
    let task = pump.spawn();

    let mut connects = 0;
    for entry in entries {
        let session = SessionId(connects);
        let event = match entry {
            ReplayEntry::Connected => {
                connects += 1;
                ClientEvent::Connected
            },
            ReplayEntry::Message(message) => ClientEvent::MessageReceived { session, message },
            ReplayEntry::Disconnected => ClientEvent::Disconnected { session },
        };
        if handles.events.send(event).await.is_err() {
            break;
        }
    }
    drop(handles.events);

    let client = task.await.map_err(|e| ReplayError::Task(e.to_string()))?;

    let mut commands = 0;
    while let Ok(command) = handles.commands.try_recv() {
        tracing::debug!(command = %command, "would send");
        commands += 1;
    }
    let mut notifications = 0;
    while let Ok(notification) = handles.notifications.try_recv() {
        log_notification(&notification);
        notifications += 1;
    }

    let mirror = client.mirror();
    Ok(ReplaySummary {
        entries: total,
        buffers: mirror.len(),
        lines: mirror.buffers().iter().map(|b| b.lines.len()).sum(),
        nicks: mirror.buffers().iter().map(|b| b.nicks.len()).sum(),
        notifications,
        commands,
        client: client.stats(),
        reconcile: client.reconcile_stats(),
    })
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::MirrorReplaced { buffers } => {
            tracing::info!(buffers = buffers.len(), "buffer list replaced");
        },
        Notification::LineAppended { buffer, prefix, text, .. } => {
            tracing::debug!(%buffer, %prefix, %text, "line");
        },
        Notification::NicklistCleared { buffer } => tracing::debug!(%buffer, "nicklist cleared"),
        Notification::NickAdded { buffer, prefix, name } => {
            tracing::debug!(%buffer, %prefix, %name, "nick");
        },
        Notification::NickRemoved { buffer, prefix, name } => {
            tracing::debug!(%buffer, %prefix, %name, "nick left");
        },
        Notification::DroppedUpdate { kind, identifier } => {
            tracing::info!(?kind, %identifier, "update for unknown buffer dropped");
        },
        Notification::MirrorInvalidated { cleared } => {
            tracing::info!(cleared, "mirror invalidated");
        },
    }
}
