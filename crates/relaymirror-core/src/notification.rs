//! Mirror change notifications for the presentation layer.

use relaymirror_proto::Pointer;

use crate::mirror::BufferSummary;

/// Which kind of incremental update was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// A chat line.
    Line,
    /// A nicklist entry.
    Nick,
}

/// Change emitted after the mirror has been updated.
///
/// Notifications are emitted in the order the changes were applied, and only
/// once the whole message has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Buffer list replaced wholesale.
    MirrorReplaced {
        /// New buffers in mirror order.
        buffers: Vec<BufferSummary>,
    },

    /// Line appended to a buffer.
    LineAppended {
        /// Owning buffer.
        buffer: Pointer,
        /// Unix timestamp in seconds.
        date: i64,
        /// Prefix, colors stripped.
        prefix: String,
        /// Text, colors stripped.
        text: String,
    },

    /// Nick set of a buffer emptied ahead of a fresh nicklist.
    NicklistCleared {
        /// Affected buffer.
        buffer: Pointer,
    },

    /// Nick added to a buffer.
    NickAdded {
        /// Owning buffer.
        buffer: Pointer,
        /// Mode prefix.
        prefix: String,
        /// Nick name.
        name: String,
    },

    /// Nick removed from a buffer by a nicklist delta.
    NickRemoved {
        /// Owning buffer.
        buffer: Pointer,
        /// Mode prefix the nick had.
        prefix: String,
        /// Nick name.
        name: String,
    },

    /// Update referenced a pointer that routes to no buffer.
    DroppedUpdate {
        /// Line or nick.
        kind: UpdateKind,
        /// The unroutable pointer.
        identifier: Pointer,
    },

    /// Routing invalidated after a disconnect.
    MirrorInvalidated {
        /// Whether the buffers were dropped too.
        cleared: bool,
    },
}
