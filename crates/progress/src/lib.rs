//! Terminal progress reporting for gleaner
//!
//! One [`Reporter`] tracks one runner invocation: a single slot for
//! monolithic queries, or one slot per task for batches, rendered as a
//! single continuously updated stderr line.

mod reporter;
mod throttle;

pub use reporter::{Counts, Reporter, TaskState};
pub use throttle::Throttle;
