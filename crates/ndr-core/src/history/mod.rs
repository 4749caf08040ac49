//! Resolution history (SQLite via sqlx).
//!
//! Every scheduled resolution job gets a row: how it was triggered, its
//! state, timestamps, and how many artifacts it copied or missed.

pub mod db;
mod runs;
pub mod types;

pub use db::HistoryDb;
pub use types::*;

#[cfg(test)]
mod tests;
