//! Operations for model-based testing.
//!
//! Operations represent everything that can happen to a client: lifecycle
//! changes, server traffic (current or stale), and user input. They are
//! generated randomly and applied to both the model and the real client.

use arbitrary::Arbitrary;

/// Buffer slot; mapped to a pointer with [`crate::pointer_for`].
pub type Slot = u8;

/// One row of a generated buffer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct ModelBufferRow {
    /// Buffer slot.
    pub slot: Slot,
    /// Buffer number as sent (0 makes the whole list invalid).
    pub number: u8,
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Transport connected; a new session starts.
    Connect,

    /// Transport of the live session closed.
    Disconnect,

    /// Buffer-list snapshot on the live session.
    Resync {
        /// Rows in server order.
        rows: Vec<ModelBufferRow>,
    },

    /// One line on the live session.
    Line {
        /// Owning buffer.
        slot: Slot,
        /// Text seed.
        seed: u8,
    },

    /// One line pushed by the server after `sync`.
    LiveLine {
        /// Owning buffer.
        slot: Slot,
        /// Text seed.
        seed: u8,
    },

    /// One nicklist row on the live session.
    Nick {
        /// Owning buffer.
        slot: Slot,
        /// Group header rather than a nick.
        group: bool,
        /// Visible in the nicklist.
        visible: bool,
        /// Name seed.
        seed: u8,
    },

    /// Debug console reply carrying a buffer list.
    Debug {
        /// Buffer the payload mentions.
        slot: Slot,
    },

    /// Line row with its date missing.
    Malformed {
        /// Owning buffer.
        slot: Slot,
    },

    /// Line arriving on a session that is no longer live.
    StaleLine {
        /// Owning buffer.
        slot: Slot,
    },

    /// User input addressed to a buffer.
    Input {
        /// Target buffer.
        slot: Slot,
    },
}

/// Deterministic line text for a seed.
pub fn line_text(seed: u8) -> String {
    format!("line-{seed}")
}

/// Deterministic nick name for a seed.
pub fn nick_name(seed: u8) -> String {
    format!("nick{}", seed % 16)
}

/// Deterministic full name for a slot.
pub fn full_name(slot: Slot) -> String {
    format!("irc.test.#chan{}", slot % crate::SLOTS)
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation took effect (possibly a no-op such as a debug reply).
    Ok,
    /// Update had no routable owner.
    Dropped,
    /// Message was malformed and had no effect.
    Rejected,
    /// Message belonged to a session that is not live.
    Stale,
    /// Event was refused.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Intent needs a live session.
    NotConnected,
    /// Intent addressed an unroutable buffer.
    UnknownBuffer,
    /// Connection attempt during a live session.
    AlreadyConnected,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
