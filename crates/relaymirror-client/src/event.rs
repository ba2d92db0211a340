//! Client events and actions.

use std::fmt;

use relaymirror_core::{DiagnosticRecord, Notification};
use relaymirror_proto::{Command, Message, Pointer};

/// Identifier of one connection lifetime.
///
/// Every successful connect allocates a new, strictly larger id. Messages are
/// tagged with the session they arrived on so that traffic from a closed
/// connection can be told apart from traffic on the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Owning the transport and decoding frames into [`Message`]s
/// - Reporting connection lifecycle changes
/// - Forwarding user intents (input, debug console, manual resync)
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Transport started connecting.
    Connecting,

    /// Transport is connected; a new session begins.
    Connected,

    /// Decoded message received from the relay.
    MessageReceived {
        /// Session the message arrived on.
        session: SessionId,
        /// Decoded message.
        message: Message,
    },

    /// Transport for `session` closed.
    Disconnected {
        /// Session that ended.
        session: SessionId,
    },

    /// User typed text into a buffer.
    SendInput {
        /// Target buffer.
        buffer: Pointer,
        /// Text to send.
        text: String,
    },

    /// User typed a line in the debug console.
    SendDebug {
        /// Line as typed.
        text: String,
    },

    /// Rebuild the mirror from scratch.
    RequestResync,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// A new session began. Tag subsequent messages with this id.
    SessionStarted(SessionId),

    /// Write a command to the transport.
    Send(Command),

    /// Mirror changed.
    Notify(Notification),

    /// Record for the debug console.
    Diagnostic(DiagnosticRecord),

    /// Message was malformed and had no effect.
    MessageRejected {
        /// Message id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },
}
