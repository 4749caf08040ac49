//! Resolution job scheduler.
//!
//! Requests are serialized through one FIFO queue and executed by a
//! [`ResolutionPass`]. Automatic requests collapse; explicit ones do not.

mod job;
mod queue;

pub use job::{JobResult, ResolutionPass, ResolutionRequest, Trigger};
pub use queue::{JobHandle, ResolutionScheduler};
