//! Outgoing relay commands.
//!
//! Commands are single text lines of the form `[(id) ]name[ arguments]`. The
//! optional id is echoed back by the server in the reply message, which is how
//! replies are matched to the request that caused them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request id used for the buffer-list snapshot.
pub const LIST_BUFFERS: &str = "listbuffers";

/// Request id used for the line history.
pub const LIST_LINES: &str = "listlines";

/// Request id used for the nicklist.
pub const NICKLIST: &str = "nicklist";

/// Request ids the client tags its resync requests with.
///
/// The classifier matches replies against the same ids, so both sides must be
/// built from one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIds {
    /// Id for the buffer-list snapshot.
    pub buffers: String,
    /// Id for the line history.
    pub lines: String,
    /// Id for the nicklist.
    pub nicklist: String,
}

impl Default for RequestIds {
    fn default() -> Self {
        Self {
            buffers: LIST_BUFFERS.to_string(),
            lines: LIST_LINES.to_string(),
            nicklist: NICKLIST.to_string(),
        }
    }
}

/// A command sent to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Request an hdata table.
    Hdata {
        /// Request id echoed in the reply.
        id: Option<String>,
        /// Hdata path, e.g. `buffer:gui_buffers(*)`.
        path: String,
        /// Fields to return. Empty means all.
        keys: Vec<String>,
    },
    /// Request nicklists.
    Nicklist {
        /// Request id echoed in the reply.
        id: Option<String>,
        /// Restrict to one buffer (full name or pointer).
        buffer: Option<String>,
    },
    /// Send text to a buffer as if typed there.
    Input {
        /// Buffer full name or pointer.
        buffer: String,
        /// Text to send.
        text: String,
    },
    /// Subscribe to buffer updates.
    Sync,
    /// Unsubscribe from buffer updates.
    Desync,
    /// Liveness probe; arguments are echoed in the pong.
    Ping {
        /// Free-form arguments.
        args: String,
    },
    /// Close the relay connection.
    Quit,
    /// Pre-formatted line, e.g. from the debug console.
    Raw(String),
}

impl Command {
    /// Tag a line typed in the debug console so its reply is diagnostic.
    ///
    /// `(id) rest` becomes `(debug_id) rest`; anything else becomes
    /// `(debug) text`.
    pub fn debug_console(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('(')
            && let Some(pos) = rest.find(')')
        {
            return Self::Raw(format!("(debug_{}){}", &rest[..pos], &rest[pos + 1..]));
        }
        Self::Raw(format!("(debug) {text}"))
    }

    /// Requests that rebuild the whole mirror, in the order they must be sent.
    pub fn resync_requests(ids: &RequestIds) -> Vec<Self> {
        vec![
            Self::Hdata {
                id: Some(ids.buffers.clone()),
                path: "buffer:gui_buffers(*)".to_string(),
                keys: ["number", "full_name", "short_name", "title"].map(String::from).to_vec(),
            },
            Self::Hdata {
                id: Some(ids.lines.clone()),
                path: "buffer:gui_buffers(*)/own_lines/first_line(*)/data".to_string(),
                keys: ["date", "displayed", "prefix", "message"].map(String::from).to_vec(),
            },
            Self::Nicklist { id: Some(ids.nicklist.clone()), buffer: None },
            Self::Sync,
        ]
    }

    /// Line terminated with `\n`, ready for the transport.
    pub fn to_wire(&self) -> String {
        format!("{self}\n")
    }
}

fn write_id(f: &mut fmt::Formatter<'_>, id: Option<&String>) -> fmt::Result {
    match id {
        Some(id) => write!(f, "({id}) "),
        None => Ok(()),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hdata { id, path, keys } => {
                write_id(f, id.as_ref())?;
                write!(f, "hdata {path}")?;
                if !keys.is_empty() {
                    write!(f, " {}", keys.join(","))?;
                }
                Ok(())
            },
            Self::Nicklist { id, buffer } => {
                write_id(f, id.as_ref())?;
                f.write_str("nicklist")?;
                if let Some(buffer) = buffer {
                    write!(f, " {buffer}")?;
                }
                Ok(())
            },
            Self::Input { buffer, text } => write!(f, "input {buffer} {text}"),
            Self::Sync => f.write_str("sync"),
            Self::Desync => f.write_str("desync"),
            Self::Ping { args } if args.is_empty() => f.write_str("ping"),
            Self::Ping { args } => write!(f, "ping {args}"),
            Self::Quit => f.write_str("quit"),
            Self::Raw(line) => f.write_str(line),
        }
    }
}
