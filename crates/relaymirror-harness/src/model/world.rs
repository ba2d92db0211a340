//! Model world - the reference client.
//!
//! A deliberately naive mirror: buffers in a plain vector, owners found by
//! linear scan, duplicates handled by remove-then-append. It shares no code
//! with the real reconciler, which makes it a useful oracle.

use std::collections::BTreeSet;

use serde::Serialize;

use super::operation::{
    ModelBufferRow, Operation, OperationError, OperationResult, Slot, full_name, line_text,
    nick_name,
};
use crate::fixtures::pointer_for;

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservableState {
    /// Whether updates can be routed.
    pub routable: bool,
    /// Buffers in mirror order.
    pub buffers: Vec<ObservableBuffer>,
}

/// One buffer in an [`ObservableState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservableBuffer {
    /// Pointer, as text.
    pub pointer: String,
    /// Buffer number.
    pub number: u32,
    /// Full name.
    pub full_name: String,
    /// Line texts, oldest first.
    pub lines: Vec<String>,
    /// Nick names, sorted.
    pub nicks: Vec<String>,
}

#[derive(Debug, Clone)]
struct ModelBuffer {
    slot: Slot,
    number: u32,
    lines: Vec<String>,
    nicks: BTreeSet<String>,
}

/// Reference implementation of one client.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    clear_on_disconnect: bool,
    connected: bool,
    routable: bool,
    buffers: Vec<ModelBuffer>,
}

impl ModelWorld {
    /// Disconnected model with an empty mirror.
    pub fn new(clear_on_disconnect: bool) -> Self {
        Self { clear_on_disconnect, connected: false, routable: false, buffers: Vec::new() }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Connect => {
                if self.connected {
                    self.disconnect();
                }
                self.connected = true;
                OperationResult::Ok
            },
            Operation::Disconnect => {
                if self.connected {
                    self.disconnect();
                }
                OperationResult::Ok
            },
            Operation::StaleLine { .. } => OperationResult::Stale,
            Operation::Input { slot } => {
                if !self.connected {
                    OperationResult::Error(OperationError::NotConnected)
                } else if self.find(*slot).is_none() {
                    OperationResult::Error(OperationError::UnknownBuffer)
                } else {
                    OperationResult::Ok
                }
            },
            _ if !self.connected => OperationResult::Stale,
            Operation::Resync { rows } => self.resync(rows),
            Operation::Line { slot, seed } | Operation::LiveLine { slot, seed } => match self.find(*slot) {
                Some(i) => {
                    self.buffers[i].lines.push(line_text(*seed));
                    OperationResult::Ok
                },
                None => OperationResult::Dropped,
            },
            Operation::Nick { slot, group, visible, seed } => {
                let leaf = !*group && *visible;
                match self.find(*slot) {
                    Some(i) => {
                        let buffer = &mut self.buffers[i];
                        buffer.nicks.clear();
                        if leaf {
                            buffer.nicks.insert(nick_name(*seed));
                        }
                        OperationResult::Ok
                    },
                    None if leaf => OperationResult::Dropped,
                    None => OperationResult::Ok,
                }
            },
            Operation::Debug { .. } => OperationResult::Ok,
            Operation::Malformed { .. } => OperationResult::Rejected,
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            routable: self.routable,
            buffers: self
                .buffers
                .iter()
                .map(|b| ObservableBuffer {
                    pointer: pointer_for(b.slot).to_string(),
                    number: b.number,
                    full_name: full_name(b.slot),
                    lines: b.lines.clone(),
                    nicks: b.nicks.iter().cloned().collect(),
                })
                .collect(),
        }
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.routable = false;
        if self.clear_on_disconnect {
            self.buffers.clear();
        }
    }

    fn find(&self, slot: Slot) -> Option<usize> {
        if !self.routable {
            return None;
        }
        let slot = slot % crate::SLOTS;
        self.buffers.iter().position(|b| b.slot == slot)
    }

    fn resync(&mut self, rows: &[ModelBufferRow]) -> OperationResult {
        if rows.iter().any(|row| row.number == 0) {
            return OperationResult::Rejected;
        }

        let mut buffers: Vec<ModelBuffer> = Vec::new();
        for row in rows {
            let slot = row.slot % crate::SLOTS;
            buffers.retain(|b| b.slot != slot);
            buffers.push(ModelBuffer {
                slot,
                number: u32::from(row.number),
                lines: Vec::new(),
                nicks: BTreeSet::new(),
            });
        }
        self.buffers = buffers;
        self.routable = true;
        OperationResult::Ok
    }
}
