pub mod config;
pub mod conflict;
pub mod declarations;
pub mod dependency;
pub mod error;
pub mod fetch;
pub mod history;
pub mod jetifier;
pub mod labels;
pub mod layout;
pub mod logging;
pub mod process;
pub mod prompt;
pub mod resolve;
pub mod scheduler;
pub mod sdk;
pub mod state;
pub mod tool;
pub mod version;
