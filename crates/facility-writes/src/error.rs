use document_store::StoreError;
use facility_model::ValidationError;
use permission_error_channel::PermissionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    /// Caught before any write was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payload did not serialize to a JSON object.
    #[error("cannot encode payload: {0}")]
    Encode(StoreError),

    /// The store refused the write. The same error has already been
    /// published on the channel.
    #[error("{error}")]
    Rejected {
        error: PermissionError,
        #[source]
        source: StoreError,
    },
}

impl WriteError {
    pub fn permission_error(&self) -> Option<&PermissionError> {
        match self {
            Self::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    /// A housekeeper the tasks are assigned to has no profile yet.
    #[error("no profile for {email}; sign in with that account once before seeding")]
    MissingProfile { email: String },

    #[error("seed data did not encode: {0}")]
    Encode(StoreError),

    #[error("seed write failed: {0}")]
    Store(#[from] StoreError),
}
