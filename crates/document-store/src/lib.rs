//! # Document store
//!
//! The seam between the dashboard and its hosted document database.
//!
//! Everything above this crate talks to a [`DocumentStore`]: collection and
//! document references, one-shot reads, equality-filtered queries with a
//! single ordering, partial updates, atomic batches, server timestamps and
//! callback listeners that receive full snapshots.
//!
//! Three backends ship with the crate:
//!
//! - [`MemoryStore`]: process-local, with deny rules, used by tests and the
//!   offline CLI
//! - [`ScriptedStore`]: a test double whose listeners are driven by hand
//! - [`RestStore`]: the hosted database over its REST API, with polling
//!   listeners

mod error;
mod ids;
mod listener;
mod memory;
mod reference;
pub mod rest;
mod scripted;
mod snapshot;
mod store;
mod write;

pub use error::{StoreError, StoreResult};
pub use ids::generate_id;
pub use listener::{DocumentListener, ListenerRegistration, QueryListener};
pub use memory::{Access, AccessPolicy, MemoryStore};
pub use reference::{CollectionRef, Direction, DocumentRef, FieldFilter, OrderBy, Query};
pub use rest::RestStore;
pub use scripted::ScriptedStore;
pub use snapshot::{DocumentSnapshot, Fields, QuerySnapshot};
pub use store::DocumentStore;
pub use write::{WriteBatch, WriteData, WriteOp};
