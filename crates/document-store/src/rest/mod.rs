//! Hosted document database over its REST API.
//!
//! Writes go through `:commit` so server timestamps can be requested as
//! field transforms. Live listeners poll on an interval and deliver a
//! snapshot only when the result set changed.

pub mod codec;
mod client;
mod poll;

pub use client::{RestStore, DEFAULT_ENDPOINT};
