//! # Live bindings
//!
//! Keep a local, typed view continuously in step with a store query or
//! document.
//!
//! A binding exposes [`LiveState`] (`data`, `loading`, `error`) through a
//! `tokio::sync::watch` channel and a synchronous [`state`](LiveQuery::state)
//! read.
//!
//! # Rules
//!
//! - Binding a new reference detaches the previous listener before the new
//!   one attaches, and only once
//! - Re-binding the same `Arc` is a no-op; references compare by identity
//! - Every snapshot replaces `data` wholesale
//! - A snapshot with a record that does not decode is dropped whole
//! - Listen errors are published on the permission error channel *and* set
//!   the binding's own `error`
//! - Deliveries from a superseded listener are ignored

mod binding;
mod document;
mod query;
mod state;

pub use document::LiveDocument;
pub use query::LiveQuery;
pub use state::{LiveState, Observer};

#[cfg(test)]
mod tests;
