//! Pointer to mirror-position lookup.
//!
//! The routing index is derived state. It is rebuilt from the buffer list on
//! every resync and never edited in between, so it cannot drift from the
//! mirror it was built from.

use std::collections::HashMap;

use relaymirror_proto::Pointer;

/// Maps buffer pointers to their position in the mirror.
///
/// # Invariants
///
/// - Agreement: while valid, `lookup(p) == Some(i)` exactly when the mirror's
///   buffer at position `i` has pointer `p`.
/// - Invalidation: once invalidated, every lookup misses until the next
///   rebuild.
#[derive(Debug, Clone, Default)]
pub struct RoutingIndex {
    positions: HashMap<Pointer, usize>,
    valid: bool,
}

impl RoutingIndex {
    /// Build a valid index from pointers in mirror order.
    ///
    /// Callers pass unique pointers; on a duplicate the last position wins.
    pub fn build<'a>(pointers: impl IntoIterator<Item = &'a Pointer>) -> Self {
        let positions =
            pointers.into_iter().enumerate().map(|(pos, ptr)| (ptr.clone(), pos)).collect();
        Self { positions, valid: true }
    }

    /// Mirror position owning `pointer`. `None` if unknown or invalidated.
    pub fn lookup(&self, pointer: &Pointer) -> Option<usize> {
        if !self.valid {
            return None;
        }
        self.positions.get(pointer).copied()
    }

    /// Drop every route until the next rebuild.
    pub fn invalidate(&mut self) {
        self.positions.clear();
        self.valid = false;
    }

    /// Whether the index currently routes anything.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of routable pointers.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no pointer is routable.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// All (pointer, position) routes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, usize)> {
        self.positions.iter().map(|(ptr, pos)| (ptr, *pos))
    }
}
