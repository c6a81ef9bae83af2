//! # Facility writes
//!
//! Every create and partial update the dashboard issues goes through
//! [`Writer`]: server timestamps are attached, and a rejected write is
//! published once on the permission error channel *and* returned as `Err`.
//! Callers wanting optimistic feedback use [`Writer::spawn_create`] or
//! [`Writer::spawn_update`] and rely on the channel for failures.
//!
//! [`FacilityWrites`] layers form validation and the domain rules (status
//! transitions, stock arithmetic) over the writer. [`seed_database`]
//! populates an empty project in one atomic batch.

mod error;
mod ops;
mod seed;
mod writer;

pub use error::{SeedError, WriteError};
pub use ops::FacilityWrites;
pub use seed::{seed_database, SeedPlan, SeedReport, SEED_USERS};
pub use writer::{Writer, CREATED_AT, UPDATED_AT};

#[cfg(test)]
mod tests;
