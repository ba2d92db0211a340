//! Client errors.

use relaymirror_proto::Pointer;
use thiserror::Error;

use crate::event::SessionId;

/// Errors returned by [`crate::Client::handle`].
///
/// These reject the event itself. A malformed server message is not an error
/// here: it is reported as [`crate::ClientAction::MessageRejected`] and the
/// session carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Event needs a live session
    #[error("cannot {operation} while not connected")]
    NotConnected {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// A connection attempt was started while a session is live
    #[error("already connected (session {session})")]
    AlreadyConnected {
        /// Live session
        session: SessionId,
    },

    /// Input addressed to a buffer the mirror does not route
    #[error("unknown buffer {pointer}")]
    UnknownBuffer {
        /// Pointer that was addressed
        pointer: Pointer,
    },
}
