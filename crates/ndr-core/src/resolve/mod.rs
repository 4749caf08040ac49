//! Resolution orchestration.

mod outcome;
mod pipeline;

pub use outcome::ResolutionOutcome;
pub use pipeline::Resolver;
