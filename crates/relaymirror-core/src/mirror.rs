//! Client-side mirror of the server's buffer list.
//!
//! The [`BufferMirror`] exclusively owns every [`Buffer`]. Presentation code
//! only ever borrows buffers (by position or pointer); all mutation goes
//! through the reconciler.
//!
//! # Invariants
//!
//! - Unique Pointers: no two buffers in the mirror share a pointer.
//! - Server Order: after a resync, buffer order equals the order of the rows
//!   in the buffer-list snapshot (minus shadowed duplicates).
//! - Routing Agreement: while routable, the [`RoutingIndex`] maps each
//!   pointer to exactly the position of its buffer.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use relaymirror_proto::Pointer;

use crate::routing::RoutingIndex;

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Unix timestamp in seconds.
    pub date: i64,
    /// Prefix (usually the nick), colors stripped.
    pub prefix: String,
    /// Message text, colors stripped.
    pub text: String,
}

/// One nicklist entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nick {
    /// Mode prefix such as `@` or `+`; may be empty.
    pub prefix: String,
    /// Nick name.
    pub name: String,
}

/// Identity and display metadata of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSummary {
    /// Server pointer.
    pub pointer: Pointer,
    /// Buffer number (positive).
    pub number: u32,
    /// Full name, e.g. `irc.libera.#rust`.
    pub full_name: String,
    /// Short name when the server sent one.
    pub short_name: Option<String>,
    /// Title/topic when the server sent one.
    pub title: Option<String>,
}

/// Mirror of one server-side buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    /// Identity and display metadata.
    pub summary: BufferSummary,
    /// Line history, oldest first.
    pub lines: VecDeque<Line>,
    /// Flat nick set.
    pub nicks: BTreeSet<Nick>,
}

impl Buffer {
    /// Fresh buffer with no lines and no nicks.
    pub fn new(summary: BufferSummary) -> Self {
        Self { summary, lines: VecDeque::new(), nicks: BTreeSet::new() }
    }

    /// Server pointer.
    pub fn pointer(&self) -> &Pointer {
        &self.summary.pointer
    }

    /// Append a line, evicting the oldest ones beyond `cap`.
    pub(crate) fn push_line(&mut self, line: Line, cap: Option<usize>) {
        self.lines.push_back(line);
        if let Some(cap) = cap {
            while self.lines.len() > cap {
                self.lines.pop_front();
            }
        }
    }

    /// Add a nick. Returns `false` if it was already present.
    pub(crate) fn add_nick(&mut self, nick: Nick) -> bool {
        self.nicks.insert(nick)
    }

    /// Remove the nick called `name`, whatever its prefix.
    pub(crate) fn remove_nick(&mut self, name: &str) -> Option<Nick> {
        let nick = self.nicks.iter().find(|n| n.name == name)?.clone();
        self.nicks.take(&nick)
    }

    pub(crate) fn clear_nicks(&mut self) {
        self.nicks.clear();
    }
}

/// Per-buffer counts in a [`MirrorSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    /// Identity and display metadata.
    pub summary: BufferSummary,
    /// Number of lines held.
    pub line_count: usize,
    /// Number of nicks held.
    pub nick_count: usize,
}

/// Point-in-time view of the mirror, cheap enough to publish after every
/// reconciled message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorSnapshot {
    /// Whether routing is currently valid.
    pub routable: bool,
    /// Buffers in mirror order.
    pub buffers: Vec<BufferSnapshot>,
    /// Routing index contents.
    pub routes: BTreeMap<Pointer, usize>,
}

/// Ordered list of buffers plus its routing index.
#[derive(Debug, Clone, Default)]
pub struct BufferMirror {
    buffers: Vec<Buffer>,
    index: RoutingIndex,
}

impl BufferMirror {
    /// Empty, unroutable mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every buffer and rebuild routing.
    ///
    /// When a pointer occurs more than once, the later buffer wins and the
    /// earlier one is removed. Returns the number of removed duplicates.
    pub fn replace(&mut self, buffers: Vec<Buffer>) -> usize {
        let mut last_seen: HashMap<Pointer, usize> = HashMap::with_capacity(buffers.len());
        for (pos, buffer) in buffers.iter().enumerate() {
            last_seen.insert(buffer.pointer().clone(), pos);
        }

        let total = buffers.len();
        let unique: Vec<Buffer> = buffers
            .into_iter()
            .enumerate()
            .filter(|(pos, buffer)| last_seen.get(buffer.pointer()) == Some(pos))
            .map(|(_, buffer)| buffer)
            .collect();

        let shadowed = total - unique.len();
        self.index = RoutingIndex::build(unique.iter().map(Buffer::pointer));
        self.buffers = unique;
        shadowed
    }

    /// Invalidate routing; with `clear`, also drop every buffer.
    pub fn invalidate(&mut self, clear: bool) {
        self.index.invalidate();
        if clear {
            self.buffers.clear();
        }
    }

    /// Whether line and nick updates can currently be routed.
    pub fn is_routable(&self) -> bool {
        self.index.is_valid()
    }

    /// Buffers in mirror order.
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the mirror holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Buffer at a mirror position.
    pub fn at(&self, position: usize) -> Option<&Buffer> {
        self.buffers.get(position)
    }

    /// Position of the buffer with `pointer`, via the routing index.
    pub fn position(&self, pointer: &Pointer) -> Option<usize> {
        self.index.lookup(pointer)
    }

    /// Buffer with `pointer`, via the routing index.
    pub fn get(&self, pointer: &Pointer) -> Option<&Buffer> {
        self.position(pointer).and_then(|pos| self.buffers.get(pos))
    }

    pub(crate) fn route_mut(&mut self, pointer: &Pointer) -> Option<&mut Buffer> {
        let pos = self.index.lookup(pointer)?;
        self.buffers.get_mut(pos)
    }

    /// Routing index backing [`BufferMirror::get`].
    pub fn index(&self) -> &RoutingIndex {
        &self.index
    }

    /// Summaries in mirror order.
    pub fn summaries(&self) -> Vec<BufferSummary> {
        self.buffers.iter().map(|b| b.summary.clone()).collect()
    }

    /// Counts-only view of the current state.
    pub fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            routable: self.index.is_valid(),
            buffers: self
                .buffers
                .iter()
                .map(|b| BufferSnapshot {
                    summary: b.summary.clone(),
                    line_count: b.lines.len(),
                    nick_count: b.nicks.len(),
                })
                .collect(),
            routes: self.index.iter().map(|(ptr, pos)| (ptr.clone(), pos)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(ptr: &str, number: u32, name: &str) -> Buffer {
        Buffer::new(BufferSummary {
            pointer: Pointer::from(ptr),
            number,
            full_name: name.to_string(),
            short_name: None,
            title: None,
        })
    }

    #[test]
    fn replace_keeps_server_order() {
        let mut mirror = BufferMirror::new();
        let shadowed = mirror.replace(vec![buffer("0x2", 2, "#b"), buffer("0x1", 1, "#a")]);

        assert_eq!(shadowed, 0);
        let names: Vec<_> = mirror.buffers().iter().map(|b| b.summary.full_name.as_str()).collect();
        assert_eq!(names, ["#b", "#a"]);
        assert_eq!(mirror.position(&Pointer::from("0x1")), Some(1));
    }

    #[test]
    fn duplicate_pointer_last_row_wins() {
        let mut mirror = BufferMirror::new();
        let shadowed = mirror.replace(vec![
            buffer("0x1", 1, "old"),
            buffer("0x2", 2, "#b"),
            buffer("0x1", 3, "new"),
        ]);

        assert_eq!(shadowed, 1);
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.at(0).map(|b| b.summary.full_name.as_str()), Some("#b"));
        assert_eq!(mirror.get(&Pointer::from("0x1")).map(|b| b.summary.number), Some(3));
    }

    #[test]
    fn invalidate_without_clear_keeps_buffers_but_stops_routing() {
        let mut mirror = BufferMirror::new();
        mirror.replace(vec![buffer("0x1", 1, "core.weechat")]);
        mirror.invalidate(false);

        assert_eq!(mirror.len(), 1);
        assert!(!mirror.is_routable());
        assert!(mirror.get(&Pointer::from("0x1")).is_none());
    }

    #[test]
    fn line_cap_evicts_oldest() {
        let mut buf = buffer("0x1", 1, "#a");
        for date in 0..5 {
            buf.push_line(Line { date, prefix: String::new(), text: String::new() }, Some(3));
        }
        let dates: Vec<_> = buf.lines.iter().map(|l| l.date).collect();
        assert_eq!(dates, [2, 3, 4]);
    }

    #[test]
    fn remove_nick_ignores_prefix() {
        let mut buf = buffer("0x1", 1, "#a");
        buf.add_nick(Nick { prefix: "@".into(), name: "alice".into() });
        buf.add_nick(Nick { prefix: String::new(), name: "bob".into() });

        let removed = buf.remove_nick("alice");
        assert_eq!(removed.map(|n| n.prefix), Some("@".to_string()));
        assert!(buf.remove_nick("alice").is_none());
        assert_eq!(buf.nicks.len(), 1);
    }

    #[test]
    fn snapshot_reports_routes() {
        let mut mirror = BufferMirror::new();
        mirror.replace(vec![buffer("0x1", 1, "#a"), buffer("0x2", 2, "#b")]);
        let snapshot = mirror.snapshot();

        assert!(snapshot.routable);
        assert_eq!(snapshot.routes.get(&Pointer::from("0x2")), Some(&1));
    }
}
