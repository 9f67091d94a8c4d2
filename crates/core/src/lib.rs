//! Core domain types, errors, and constants for the `gleaner` pipeline.
//!
//! Everything here is I/O-free: the error taxonomy shared by every crate,
//! the [`Outcome`] envelope the batch runner returns, the [`IsEmpty`]
//! capability that drives the empty-result policy, and small text helpers
//! used by failure logging.

pub mod constants;
pub mod empty;
pub mod errors;
pub mod outcome;
pub mod text;

pub use self::{
    constants::*,
    empty::IsEmpty,
    errors::{Error, Result},
    outcome::{successes, Outcome},
};
