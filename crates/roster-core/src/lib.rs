//! Core types and trait definitions for the Roster enrollment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The interesting part is small: [`period`] answers "is this record active
//! on day D" under one boundary policy, [`arbiter`] enforces at most one
//! active record per (subject, target) key, and [`lifecycle`] expresses the
//! three assignment/enrollment state machines on top of the arbiter. Storage
//! backends run those decisions inside a single transaction per call.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod arbiter;
pub mod catalog;
pub mod clock;
pub mod enrollment;
pub mod error;
pub mod lifecycle;
pub mod period;
pub mod policy;
pub mod store;

pub use error::{Error, ErrorKind, Result, StoreError};
