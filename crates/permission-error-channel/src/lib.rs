//! # Permission error channel
//!
//! A process-wide publish/subscribe bus for reads and writes that the
//! document store's access rules denied. Bindings and write operations
//! publish here; one top-level handler turns events into a diagnostic.
//!
//! # Delivery
//!
//! - Handlers run synchronously inside [`PermissionErrorChannel::publish`]
//! - Handlers run in registration order
//! - Nothing is buffered: events published before a handler subscribes are
//!   never seen by it

mod channel;
mod error;
mod handlers;

pub use channel::{PermissionErrorChannel, SubscriptionId};
pub use error::{Operation, PermissionError};
pub use handlers::{log_reporter, RecordingHandler};
