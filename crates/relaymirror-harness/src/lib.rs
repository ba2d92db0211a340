//! Test harness for relaymirror.
//!
//! Fixtures that build relay messages the way a live server shapes them, a
//! reference model of the client, seeded scenarios, and invariant checks.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation. Operations are
//! applied to both the model and the real client (via [`Driver`]), and their
//! results and observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module verifies structural properties of the mirror that
//! must hold after every event. Use [`InvariantRegistry::standard()`] for the
//! full set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod fixtures;
pub mod invariants;
pub mod model;
pub mod scenario;

pub use driver::Driver;
pub use fixtures::{BufferRow, LineRow, NickRow, SLOTS, pointer_for};
pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, LineCapRespected, PositiveBufferNumbers,
    RoutingAgreement, SessionMonotonicity, SystemSnapshot, UniqueBufferPointers, Violation,
};
pub use model::{
    ModelBufferRow, ModelWorld, ObservableBuffer, ObservableState, Operation, OperationError,
    OperationResult,
};
pub use scenario::Scenario;
