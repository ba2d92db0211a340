//! Core
//!
//! Client-side reconciliation for the relay protocol. Keeps a local mirror of
//! the server's buffer list, line history and nicklists consistent with
//! whatever the server reports.
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O. Decoded [`relaymirror_proto::Message`]s
//! go in through [`Reconciler::apply`], mirror mutations and
//! [`Notification`]s come out. Color stripping and diagnostic echo are
//! collaborators behind the [`ColorStrip`] and [`DiagnosticSink`] traits.
//!
//! # Components
//!
//! - [`BufferMirror`]: ordered buffers plus their [`RoutingIndex`]
//! - [`Classifier`]: picks the routine for each message
//! - [`Reconciler`]: two-phase apply of one message
//! - [`Notification`]: change events for the presentation layer
//! - [`DiagnosticRecord`]: debug console and outgoing command echo

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod classify;
pub mod diagnostic;
pub mod error;
pub mod mirror;
mod notification;
pub mod reconciler;
mod routing;
mod strip;

pub use classify::{Classifier, ClassifierConfig, MessageKind};
pub use diagnostic::{DiagnosticRecord, DiagnosticSink, Direction, Hint, TracingDiagnostics};
pub use error::ReconcileError;
pub use mirror::{Buffer, BufferMirror, BufferSnapshot, BufferSummary, Line, MirrorSnapshot, Nick};
pub use notification::{Notification, UpdateKind};
pub use reconciler::{NicklistMode, Outcome, ReconcileStats, Reconciler, ReconcilerConfig};
pub use routing::RoutingIndex;
pub use strip::{ColorStrip, Verbatim};
