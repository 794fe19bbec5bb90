//! Core types and trait definitions for the Sojourn ingestion pipeline.
//!
//! This crate has no HTTP, XML or database dependencies.
//! The other crates depend on it: the track parser produces [`Sample`]s, the
//! stay detector collapses them into [`Stay`]s, and storage backends
//! implement [`store::EventStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod place;
pub mod sample;
pub mod session;
pub mod stay;
pub mod store;

pub use error::{Error, Result};
pub use sample::{Sample, Stay};
