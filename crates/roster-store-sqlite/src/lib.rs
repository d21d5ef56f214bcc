//! SQLite backend for the Roster enrollment engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write runs in its own
//! `BEGIN IMMEDIATE` transaction, and partial unique indexes back the
//! at-most-one-active rule at the storage level.

mod encode;
mod engine;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
