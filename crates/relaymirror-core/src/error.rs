//! Reconciliation errors.
//!
//! Every error here means "this one message had no effect". None of them is
//! fatal: the mirror is left exactly as it was before the message arrived.

use relaymirror_proto::ProtocolError;
use thiserror::Error;

use crate::classify::MessageKind;

/// A message was rejected without touching the mirror.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A row lacked a required field, had a wrongly typed field, or had no
    /// ancestry pointer.
    #[error("malformed {kind} row {row}: {source}")]
    MalformedRow {
        /// Routine that was reading the row
        kind: MessageKind,
        /// Row index within its hdata object
        row: usize,
        /// Underlying accessor error
        #[source]
        source: ProtocolError,
    },

    /// Message was routed to a reconciliation routine but carried no table
    /// that routine reads (e.g. a string where the hdata should be).
    #[error("{kind} message carries no `{path}` table")]
    MissingTable {
        /// Routine the message was classified for
        kind: MessageKind,
        /// Path tail that was expected
        path: &'static str,
    },

    /// Nicklist delta row carried an unknown change code.
    #[error("nicklist row {row}: unknown change code {code}")]
    InvalidNickChange {
        /// Row index within its hdata object
        row: usize,
        /// Code as received
        code: i64,
    },

    /// Buffer row carried a number that is not a positive 32-bit integer.
    #[error("buffer row {row}: number {number} is not a positive integer")]
    InvalidNumber {
        /// Row index within its hdata object
        row: usize,
        /// Number as received
        number: i64,
    },
}

impl ReconcileError {
    pub(crate) fn malformed(kind: MessageKind, row: usize) -> impl Fn(ProtocolError) -> Self + Copy {
        move |source| Self::MalformedRow { kind, row, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_names_row_and_field() {
        let err = ReconcileError::MalformedRow {
            kind: MessageKind::Lines,
            row: 3,
            source: ProtocolError::MissingField { field: "date".into() },
        };
        assert_eq!(err.to_string(), "malformed lines row 3: missing field `date`");
    }

    #[test]
    fn missing_table_names_expected_path() {
        let err = ReconcileError::MissingTable { kind: MessageKind::BufferList, path: "buffer" };
        assert_eq!(err.to_string(), "buffer list message carries no `buffer` table");
    }
}
