//! Reference model for model-based testing.
//!
//! [`ModelWorld`] is a simple, obviously-correct client. Operations are
//! applied to it and to the real client (through [`crate::Driver`]); results
//! and observable state must match.

mod operation;
mod world;

pub use operation::{
    ModelBufferRow, Operation, OperationError, OperationResult, Slot, full_name, line_text,
    nick_name,
};
pub use world::{ModelWorld, ObservableBuffer, ObservableState};
