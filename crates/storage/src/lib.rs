//! Storage Layer
//!
//! Holds student results in memory behind a single lock, assigns ids, and
//! answers the add/list/delete/clear request contract. Snapshots can be
//! written to disk so a restarted server keeps its records and id sequence.

mod message;
mod repository;
mod snapshot;

pub use message::{CallerId, Envelope, StoreRequest, StoreResponse};
pub use repository::{NewResult, ResultRepository, StoreStats, StudentResult};
pub use snapshot::Snapshot;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record {0} does not exist")]
    NotFound(u64),
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<postcard::Error> for StorageError {
    fn from(err: postcard::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
