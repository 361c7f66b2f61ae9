//! Snapshot persistence
//!
//! Records are encoded with postcard. postcard cannot express the flattened
//! JSON shape of [`StudentResult`], so records go through a plain stored form.

use crate::repository::{Inner, ResultRepository, StudentResult};
use crate::StorageError;
use grading::{Grade, SubjectMarks};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Point-in-time copy of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub next_id: u64,
    pub records: Vec<StudentResult>,
}

#[derive(Serialize, Deserialize)]
struct StoredResult {
    id: u64,
    roll_number: String,
    student_name: String,
    marks: SubjectMarks,
    total: u32,
    average: f64,
    grade: Grade,
    timestamp: i64,
}

#[derive(Serialize, Deserialize)]
struct StoredSnapshot {
    next_id: u64,
    records: Vec<StoredResult>,
}

impl From<StudentResult> for StoredResult {
    fn from(r: StudentResult) -> Self {
        Self {
            id: r.id,
            roll_number: r.roll_number,
            student_name: r.student_name,
            marks: r.marks,
            total: r.total,
            average: r.average,
            grade: r.grade,
            timestamp: r.timestamp,
        }
    }
}

impl From<StoredResult> for StudentResult {
    fn from(r: StoredResult) -> Self {
        Self {
            id: r.id,
            roll_number: r.roll_number,
            student_name: r.student_name,
            marks: r.marks,
            total: r.total,
            average: r.average,
            grade: r.grade,
            timestamp: r.timestamp,
        }
    }
}

impl Snapshot {
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        let stored = StoredSnapshot {
            next_id: self.next_id,
            records: self.records.iter().cloned().map(StoredResult::from).collect(),
        };
        Ok(postcard::to_allocvec(&stored)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let stored: StoredSnapshot = postcard::from_bytes(bytes)?;
        Ok(Self {
            next_id: stored.next_id,
            records: stored.records.into_iter().map(StudentResult::from).collect(),
        })
    }
}

impl ResultRepository {
    /// Copy the current state
    pub fn snapshot(&self) -> Result<Snapshot, StorageError> {
        let inner = self.lock()?;
        Ok(Snapshot {
            next_id: inner.next_id,
            records: inner.records.values().cloned().collect(),
        })
    }

    /// Rebuild a repository. The counter never falls at or below an id
    /// already present; a record at `u64::MAX` leaves no id to assign and
    /// is rejected.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StorageError> {
        let mut floor = 0u64;
        for record in &snapshot.records {
            let above = record.id.checked_add(1).ok_or_else(|| {
                StorageError::Serialization(format!(
                    "record id {} leaves no id for the next result",
                    record.id
                ))
            })?;
            floor = floor.max(above);
        }

        let inner = Inner {
            next_id: snapshot.next_id.max(floor),
            records: snapshot.records.into_iter().map(|r| (r.id, r)).collect(),
        };
        Ok(Self::from_inner(inner))
    }

    /// Write the current state to `path`, replacing any previous snapshot
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let snapshot = self.snapshot()?;
        let bytes = snapshot.encode()?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(
            "Saved snapshot of {} result(s) to {}",
            snapshot.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a repository from `path`, or start empty if there is no snapshot yet
    pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = Snapshot::decode(&bytes)?;
        info!(
            "Loaded {} result(s) from {} (next id {})",
            snapshot.records.len(),
            path.display(),
            snapshot.next_id
        );
        Self::from_snapshot(snapshot)
    }
}
