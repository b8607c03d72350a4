//! Usage report derivation.
//!
//! Turns a [`Snapshot`](common::models::Snapshot) into a
//! [`UsageReport`](common::models::UsageReport). Pure: no I/O and no shared
//! state, so independent snapshots may be analyzed concurrently.

pub mod service;

pub use service::{analyze, PADDING_FACTOR_LIMIT};
