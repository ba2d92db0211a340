//! Message reconciliation.
//!
//! The [`Reconciler`] turns one classified [`Message`] into mirror mutations
//! and the matching [`Notification`]s.
//!
//! # Two Phases
//!
//! Every row the message carries is parsed into a plan first. Only when the
//! whole plan is valid is the mirror touched, so a malformed row anywhere in a
//! message rejects the entire message and leaves the mirror unchanged.
//!
//! # Routing
//!
//! Line and nick rows are routed by ancestry element 0 through the mirror's
//! routing index. Rows that route nowhere (stale pointer, or a resync racing
//! in-flight data) are dropped, counted, and reported as
//! [`Notification::DroppedUpdate`]; they are never an error.
//!
//! # Nicklist Deltas
//!
//! Live nicklist events carry a `_diff` change code per row (`^` parent
//! group, `+` added, `-` removed, `*` updated). A message with any such row
//! is applied as a delta: nothing is cleared, even in
//! [`NicklistMode::Replace`].

use std::collections::HashSet;

use relaymirror_proto::{Hdata, Message, Pointer};

use crate::{
    classify::{Classifier, ClassifierConfig, MessageKind},
    error::ReconcileError,
    mirror::{Buffer, BufferMirror, BufferSummary, Line, Nick},
    notification::{Notification, UpdateKind},
    strip::{ColorStrip, Verbatim},
};

/// Field carrying the change code of a nicklist delta row.
const DIFF_FIELD: &str = "_diff";

/// How a nicklist message relates to the nick sets already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NicklistMode {
    /// Every buffer referenced by the message has its nick set cleared
    /// before the rows are applied.
    #[default]
    Replace,
    /// Rows are added to the existing sets; nothing is ever removed.
    Additive,
}

/// Reconciler configuration.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Message classification rules.
    pub classifier: ClassifierConfig,
    /// Nicklist policy.
    pub nicklist_mode: NicklistMode,
    /// Per-buffer line cap. `None` keeps every line.
    pub max_lines_per_buffer: Option<usize>,
}

/// Counters exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    /// Buffer-list resyncs applied.
    pub resyncs: u64,
    /// Lines appended to some buffer.
    pub lines_appended: u64,
    /// Nicks newly added to some buffer.
    pub nicks_added: u64,
    /// Nicks removed by nicklist deltas.
    pub nicks_removed: u64,
    /// Line rows whose owner was not routable.
    pub dropped_lines: u64,
    /// Nick rows whose owner was not routable.
    pub dropped_nicks: u64,
    /// Messages rejected as malformed.
    pub rejected_messages: u64,
    /// Messages classified as ignored.
    pub ignored_messages: u64,
    /// Messages classified as diagnostic.
    pub diagnostic_messages: u64,
}

/// Result of reconciling one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// How the message was classified.
    pub kind: MessageKind,
    /// Changes applied, in order.
    pub notifications: Vec<Notification>,
}

struct RoutedLine {
    owner: Pointer,
    line: Line,
}

enum NickEdit {
    Add(Nick),
    Update(Nick),
    Remove(Nick),
    /// Group headers, parent markers and invisible nicks.
    Skip,
}

struct NickRow {
    owner: Pointer,
    edit: NickEdit,
}

enum Plan {
    Resync(Vec<Vec<Buffer>>),
    Lines(Vec<RoutedLine>),
    Nicks { rows: Vec<NickRow>, delta: bool },
    Skip,
}

/// Applies messages to a [`BufferMirror`].
///
/// Generic over the color-stripping collaborator; [`Verbatim`] keeps text as
/// received.
#[derive(Debug, Clone)]
pub struct Reconciler<S = Verbatim> {
    classifier: Classifier,
    nicklist_mode: NicklistMode,
    max_lines: Option<usize>,
    strip: S,
    stats: ReconcileStats,
}

impl Reconciler<Verbatim> {
    /// Reconciler that keeps text verbatim.
    pub fn new(config: ReconcilerConfig) -> Self {
        Self::with_strip(config, Verbatim)
    }
}

impl Default for Reconciler<Verbatim> {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}

impl<S: ColorStrip> Reconciler<S> {
    /// Reconciler using `strip` on line prefixes and texts.
    pub fn with_strip(config: ReconcilerConfig, strip: S) -> Self {
        Self {
            classifier: Classifier::new(config.classifier),
            nicklist_mode: config.nicklist_mode,
            max_lines: config.max_lines_per_buffer,
            strip,
            stats: ReconcileStats::default(),
        }
    }

    /// Classifier in use.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Counters so far.
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Reconcile one message into `mirror`.
    ///
    /// # Errors
    ///
    /// - `ReconcileError::MalformedRow` / `InvalidNumber` /
    ///   `InvalidNickChange` if any row of a reconciled hdata object is
    ///   malformed
    /// - `ReconcileError::MissingTable` if the message carries no table of
    ///   the kind it was classified as
    ///
    /// The mirror is unchanged on error.
    pub fn apply(
        &mut self,
        mirror: &mut BufferMirror,
        message: &Message,
    ) -> Result<Outcome, ReconcileError> {
        let kind = self.classifier.classify(message);

        let plan = match self.plan(kind, message) {
            Ok(plan) => plan,
            Err(err) => {
                self.stats.rejected_messages += 1;
                tracing::warn!(id = %message.id, %kind, error = %err, "message rejected");
                return Err(err);
            },
        };

        let notifications = match plan {
            Plan::Resync(snapshots) => self.apply_resync(mirror, snapshots),
            Plan::Lines(lines) => self.apply_lines(mirror, lines),
            Plan::Nicks { rows, delta } => self.apply_nicks(mirror, rows, delta),
            Plan::Skip => {
                match kind {
                    MessageKind::Diagnostic => self.stats.diagnostic_messages += 1,
                    _ => {
                        self.stats.ignored_messages += 1;
                        tracing::trace!(id = %message.id, "message ignored");
                    },
                }
                Vec::new()
            },
        };

        Ok(Outcome { kind, notifications })
    }

    fn plan(&self, kind: MessageKind, message: &Message) -> Result<Plan, ReconcileError> {
        let Some(tail) = kind.path_tail() else {
            return Ok(Plan::Skip);
        };
        // An empty result comes back as a table with no path and no rows.
        let tables: Vec<&Hdata> = message
            .hdata()
            .filter(|hdata| {
                hdata.path_tail() == Some(tail)
                    || (hdata.items.is_empty() && hdata.path_tail().is_none_or(str::is_empty))
            })
            .collect();
        if tables.is_empty() {
            return Err(ReconcileError::MissingTable { kind, path: tail });
        }
        let tables = tables.into_iter();

        Ok(match kind {
            MessageKind::BufferList => {
                Plan::Resync(tables.map(parse_buffers).collect::<Result<_, _>>()?)
            },
            MessageKind::Lines => {
                let mut lines = Vec::new();
                for hdata in tables {
                    lines.extend(self.parse_lines(hdata)?);
                }
                Plan::Lines(lines)
            },
            MessageKind::Nicklist => {
                let mut rows = Vec::new();
                let mut delta = false;
                for hdata in tables {
                    delta |= hdata.items.iter().any(|item| item.fields.contains_key(DIFF_FIELD));
                    rows.extend(parse_nicks(hdata)?);
                }
                Plan::Nicks { rows, delta }
            },
            MessageKind::Diagnostic | MessageKind::Ignored => Plan::Skip,
        })
    }

    fn parse_lines(&self, hdata: &Hdata) -> Result<Vec<RoutedLine>, ReconcileError> {
        hdata
            .items
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let malformed = ReconcileError::malformed(MessageKind::Lines, row);
                Ok(RoutedLine {
                    owner: item.owner().map_err(malformed)?.clone(),
                    line: Line {
                        date: item.integer("date").map_err(malformed)?,
                        prefix: self.strip.strip(item.text("prefix").map_err(malformed)?),
                        text: self.strip.strip(item.text("message").map_err(malformed)?),
                    },
                })
            })
            .collect()
    }

    fn apply_resync(
        &mut self,
        mirror: &mut BufferMirror,
        snapshots: Vec<Vec<Buffer>>,
    ) -> Vec<Notification> {
        let mut notifications = Vec::with_capacity(snapshots.len());
        for buffers in snapshots {
            let shadowed = mirror.replace(buffers);
            if shadowed > 0 {
                tracing::warn!(shadowed, "buffer list repeated pointers; later rows kept");
            }
            self.stats.resyncs += 1;
            tracing::info!(buffers = mirror.len(), "mirror replaced");
            notifications.push(Notification::MirrorReplaced { buffers: mirror.summaries() });
        }
        notifications
    }

    fn apply_lines(&mut self, mirror: &mut BufferMirror, lines: Vec<RoutedLine>) -> Vec<Notification> {
        let mut notifications = Vec::with_capacity(lines.len());
        for RoutedLine { owner, line } in lines {
            match mirror.route_mut(&owner) {
                Some(buffer) => {
                    notifications.push(Notification::LineAppended {
                        buffer: owner,
                        date: line.date,
                        prefix: line.prefix.clone(),
                        text: line.text.clone(),
                    });
                    buffer.push_line(line, self.max_lines);
                    self.stats.lines_appended += 1;
                },
                None => {
                    self.stats.dropped_lines += 1;
                    tracing::debug!(pointer = %owner, "line for unknown buffer dropped");
                    notifications
                        .push(Notification::DroppedUpdate { kind: UpdateKind::Line, identifier: owner });
                },
            }
        }
        notifications
    }

    fn apply_nicks(
        &mut self,
        mirror: &mut BufferMirror,
        rows: Vec<NickRow>,
        delta: bool,
    ) -> Vec<Notification> {
        let mut notifications = Vec::new();

        if self.nicklist_mode == NicklistMode::Replace && !delta {
            let mut seen = HashSet::new();
            for row in &rows {
                if !seen.insert(&row.owner) {
                    continue;
                }
                if let Some(buffer) = mirror.route_mut(&row.owner) {
                    buffer.clear_nicks();
                    notifications.push(Notification::NicklistCleared { buffer: row.owner.clone() });
                }
            }
        }

        for NickRow { owner, edit } in rows {
            if matches!(edit, NickEdit::Skip) {
                continue;
            }
            let Some(buffer) = mirror.route_mut(&owner) else {
                self.stats.dropped_nicks += 1;
                tracing::debug!(pointer = %owner, "nick for unknown buffer dropped");
                notifications
                    .push(Notification::DroppedUpdate { kind: UpdateKind::Nick, identifier: owner });
                continue;
            };

            let (removed, added) = match edit {
                NickEdit::Add(nick) => (None, Some(nick)),
                NickEdit::Update(nick) => match buffer.remove_nick(&nick.name) {
                    Some(old) if old == nick => {
                        buffer.add_nick(old);
                        (None, None)
                    },
                    old => (old, Some(nick)),
                },
                NickEdit::Remove(nick) => (buffer.remove_nick(&nick.name), None),
                NickEdit::Skip => (None, None),
            };

            if let Some(old) = removed {
                self.stats.nicks_removed += 1;
                notifications.push(Notification::NickRemoved {
                    buffer: owner.clone(),
                    prefix: old.prefix,
                    name: old.name,
                });
            }
            if let Some(nick) = added {
                let notification = Notification::NickAdded {
                    buffer: owner,
                    prefix: nick.prefix.clone(),
                    name: nick.name.clone(),
                };
                if buffer.add_nick(nick) {
                    self.stats.nicks_added += 1;
                    notifications.push(notification);
                }
            }
        }
        notifications
    }
}

fn parse_buffers(hdata: &Hdata) -> Result<Vec<Buffer>, ReconcileError> {
    hdata
        .items
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let malformed = ReconcileError::malformed(MessageKind::BufferList, row);
            let number = item.integer("number").map_err(malformed)?;
            let number = u32::try_from(number)
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ReconcileError::InvalidNumber { row, number })?;

            Ok(Buffer::new(BufferSummary {
                pointer: item.owner().map_err(malformed)?.clone(),
                number,
                full_name: item.text("full_name").map_err(malformed)?.to_string(),
                short_name: item.optional_text("short_name").map_err(malformed)?.map(str::to_string),
                title: item.optional_text("title").map_err(malformed)?.map(str::to_string),
            }))
        })
        .collect()
}

fn parse_nicks(hdata: &Hdata) -> Result<Vec<NickRow>, ReconcileError> {
    hdata
        .items
        .iter()
        .enumerate()
        .map(|(row, item)| {
            let malformed = ReconcileError::malformed(MessageKind::Nicklist, row);
            let owner = item.owner().map_err(malformed)?.clone();
            let change = if item.fields.contains_key(DIFF_FIELD) {
                let code = item.integer(DIFF_FIELD).map_err(malformed)?;
                Some(NickChange::from_code(code).ok_or(ReconcileError::InvalidNickChange { row, code })?)
            } else {
                None
            };
            if change == Some(NickChange::Parent) {
                return Ok(NickRow { owner, edit: NickEdit::Skip });
            }

            let group = item.flag("group").map_err(malformed)?;
            if group {
                return Ok(NickRow { owner, edit: NickEdit::Skip });
            }
            let visible = item.flag("visible").map_err(malformed)?;
            let nick = Nick {
                prefix: item.text("prefix").map_err(malformed)?.to_string(),
                name: item.text("name").map_err(malformed)?.to_string(),
            };

            let edit = match (change, visible) {
                (Some(NickChange::Removed), _) | (Some(NickChange::Updated), false) => {
                    NickEdit::Remove(nick)
                },
                (Some(NickChange::Updated), true) => NickEdit::Update(nick),
                (_, true) => NickEdit::Add(nick),
                (_, false) => NickEdit::Skip,
            };
            Ok(NickRow { owner, edit })
        })
        .collect()
}

/// Change code of a nicklist delta row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NickChange {
    Parent,
    Added,
    Removed,
    Updated,
}

impl NickChange {
    fn from_code(code: i64) -> Option<Self> {
        match u8::try_from(code).ok()? {
            b'^' => Some(Self::Parent),
            b'+' => Some(Self::Added),
            b'-' => Some(Self::Removed),
            b'*' => Some(Self::Updated),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_codes() {
        let codes: Vec<_> =
            [b'^', b'+', b'-', b'*'].into_iter().map(|c| NickChange::from_code(i64::from(c))).collect();
        assert_eq!(codes, [
            Some(NickChange::Parent),
            Some(NickChange::Added),
            Some(NickChange::Removed),
            Some(NickChange::Updated),
        ]);
        assert_eq!(NickChange::from_code(i64::from(b'x')), None);
        assert_eq!(NickChange::from_code(-1), None);
    }
}
