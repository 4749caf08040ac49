//! CLI command handlers, one file per command.

mod clean;
mod completions;
mod conflicts;
mod deps;
mod history;
mod resolve;
mod sdk;

pub use clean::run_clean;
pub use completions::run_completions;
pub use conflicts::run_conflicts;
pub use deps::run_deps;
pub use history::run_history;
pub use resolve::run_resolve;
pub use sdk::{run_sdk_install, run_sdk_list};
