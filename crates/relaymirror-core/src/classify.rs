//! Message classification.
//!
//! Decides which reconciliation routine a message gets, before any of its
//! contents are read. Classification never fails: anything not recognised is
//! [`MessageKind::Ignored`].
//!
//! Rules, first match wins:
//!
//! 1. id starts with the debug prefix: [`MessageKind::Diagnostic`]
//! 2. id equals one of the configured request ids: that kind
//! 3. unsolicited server event (empty or `_`-prefixed id) whose first known
//!    path tail is `buffer`: ignored
//! 4. otherwise the path tail of the first hdata with a known tail decides
//!
//! Rule 3 keeps single-buffer events such as `_buffer_opened` (whose path
//! also ends in `buffer`) from being mistaken for a full buffer-list
//! snapshot. Live lines (`_buffer_line_added`) and nicklists (`_nicklist`,
//! `_nicklist_diff`) are reconciled like their requested counterparts.

use std::fmt;

use relaymirror_proto::{DEBUG_PREFIX, Message, RequestIds};

/// Path tail of buffer-list rows.
pub const BUFFER_PATH: &str = "buffer";

/// Path tail of line rows.
pub const LINE_PATH: &str = "line_data";

/// Path tail of nicklist rows.
pub const NICK_PATH: &str = "nick_group";

/// Reconciliation routine for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Full buffer-list snapshot.
    BufferList,
    /// Line history / new lines.
    Lines,
    /// Nicklist.
    Nicklist,
    /// Debug console exchange; never reconciled.
    Diagnostic,
    /// Unrecognised; never reconciled.
    Ignored,
}

impl MessageKind {
    /// Hdata path tail this kind reconciles. `None` for non-reconciled kinds.
    pub fn path_tail(self) -> Option<&'static str> {
        match self {
            Self::BufferList => Some(BUFFER_PATH),
            Self::Lines => Some(LINE_PATH),
            Self::Nicklist => Some(NICK_PATH),
            Self::Diagnostic | Self::Ignored => None,
        }
    }

    fn from_path_tail(tail: &str) -> Option<Self> {
        match tail {
            BUFFER_PATH => Some(Self::BufferList),
            LINE_PATH => Some(Self::Lines),
            NICK_PATH => Some(Self::Nicklist),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BufferList => "buffer list",
            Self::Lines => "lines",
            Self::Nicklist => "nicklist",
            Self::Diagnostic => "diagnostic",
            Self::Ignored => "ignored",
        })
    }
}

/// Classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Id prefix marking debug console exchanges.
    pub debug_prefix: String,
    /// Ids the resync requests were tagged with.
    pub request_ids: RequestIds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { debug_prefix: DEBUG_PREFIX.to_string(), request_ids: RequestIds::default() }
    }
}

/// Maps messages to a [`MessageKind`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a message.
    pub fn classify(&self, message: &Message) -> MessageKind {
        let ids = &self.config.request_ids;

        if message.is_debug(&self.config.debug_prefix) {
            return MessageKind::Diagnostic;
        }
        if message.id == ids.buffers {
            return MessageKind::BufferList;
        }
        if message.id == ids.lines {
            return MessageKind::Lines;
        }
        if message.id == ids.nicklist {
            return MessageKind::Nicklist;
        }

        let by_path =
            message.hdata().find_map(|hdata| hdata.path_tail().and_then(MessageKind::from_path_tail));
        match by_path {
            Some(MessageKind::BufferList) if message.is_unsolicited() => MessageKind::Ignored,
            Some(kind) => kind,
            None => MessageKind::Ignored,
        }
    }
}
