//! Relay protocol data model.
//!
//! Value types shared by every layer of relaymirror. The binary wire decoder
//! lives outside this workspace; it hands over fully decoded [`Message`]s
//! built from the types defined here.
//!
//! # Components
//!
//! - [`Object`]: closed tagged variant over every protocol value kind
//! - [`Hdata`] / [`HdataItem`]: typed tables whose rows carry ancestry pointers
//! - [`Message`]: one decoded frame (id, objects, size metadata)
//! - [`Command`]: outgoing text commands, including the resync request set

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod errors;
mod message;
mod object;

pub use command::{Command, RequestIds};
pub use errors::{ProtocolError, Result};
pub use message::{DEBUG_PREFIX, Decompression, Message};
pub use object::{Array, Hashtable, Hdata, HdataItem, Object, ObjectType, Pointer};
