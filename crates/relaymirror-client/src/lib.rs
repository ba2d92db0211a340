//! Client
//!
//! Action-based session state machine for a relay client. Owns the buffer
//! mirror and ties reconciliation to the connection lifecycle.
//!
//! # Architecture
//!
//! The client is Sans-IO. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute: commands to write, notifications to render, records
//! for the debug console.
//!
//! # Components
//!
//! - [`Client`]: session lifecycle plus mirror and reconciler
//! - [`SessionId`]: tags messages with the connection they arrived on
//! - [`ClientEvent`]: events fed into the client
//! - [`ClientAction`]: actions produced by the client
//!
//! # Runtime (optional)
//!
//! With the `runtime` feature enabled, this crate also provides
//! [`runtime::Pump`], a tokio task that owns the client and publishes mirror
//! snapshots on a `watch` channel.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;

#[cfg(feature = "runtime")]
pub mod runtime;

pub use client::{Client, ClientConfig, ClientStats, ConnectionState};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, SessionId};
