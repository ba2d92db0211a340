//! One decoded protocol message.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Hdata, Object};

/// Message identifier prefix reserved for the debug console.
pub const DEBUG_PREFIX: &str = "debug";

/// Decompression metadata for a compressed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decompression {
    /// Length of the frame body after decompression.
    pub size_uncompressed: usize,
}

/// A message as produced by the wire decoder.
///
/// `id` is empty (or starts with `_`) for unsolicited server events and
/// otherwise echoes the id of the client request being answered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Request id echoed by the server.
    pub id: String,
    /// Objects in wire order.
    pub objects: Vec<Object>,
    /// Length of the frame on the wire, in bytes.
    pub size: usize,
    /// Present when the frame body was compressed.
    pub decompression: Option<Decompression>,
    /// Frame as received. Empty when the transport does not retain it.
    #[serde(default)]
    pub raw: Bytes,
}

impl Message {
    /// Create a message with the given id and objects.
    pub fn new(id: impl Into<String>, objects: Vec<Object>) -> Self {
        Self { id: id.into(), objects, ..Self::default() }
    }

    /// Attach the raw frame bytes; also sets `size`.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<Bytes>) -> Self {
        self.raw = raw.into();
        self.size = self.raw.len();
        self
    }

    /// Id starts with the debug console prefix.
    pub fn is_debug(&self, prefix: &str) -> bool {
        self.id.starts_with(prefix)
    }

    /// Unsolicited server event (empty id or `_`-prefixed).
    pub fn is_unsolicited(&self) -> bool {
        self.id.is_empty() || self.id.starts_with('_')
    }

    /// All hdata objects in wire order.
    pub fn hdata(&self) -> impl Iterator<Item = &Hdata> {
        self.objects.iter().filter_map(Object::as_hdata)
    }
}
