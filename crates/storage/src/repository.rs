//! Repository Implementation

use crate::StorageError;
use grading::{Grade, GradeSummary, SubjectMarks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// One stored result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub id: u64,
    pub roll_number: String,
    pub student_name: String,
    #[serde(flatten)]
    pub marks: SubjectMarks,
    pub total: u32,
    pub average: f64,
    pub grade: Grade,
    /// Creation time, milliseconds since epoch
    pub timestamp: i64,
}

/// A result as supplied by the caller, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub roll_number: String,
    pub student_name: String,
    #[serde(flatten)]
    pub marks: SubjectMarks,
    pub total: u32,
    pub average: f64,
    pub grade: Grade,
    pub timestamp: i64,
}

impl NewResult {
    /// Build a result from marks and their computed summary
    pub fn from_summary(
        roll_number: impl Into<String>,
        student_name: impl Into<String>,
        marks: SubjectMarks,
        summary: GradeSummary,
        timestamp: i64,
    ) -> Self {
        Self {
            roll_number: roll_number.into(),
            student_name: student_name.into(),
            marks,
            total: summary.total,
            average: summary.average,
            grade: summary.grade,
            timestamp,
        }
    }

    fn into_record(self, id: u64) -> StudentResult {
        StudentResult {
            id,
            roll_number: self.roll_number,
            student_name: self.student_name,
            marks: self.marks,
            total: self.total,
            average: self.average,
            grade: self.grade,
            timestamp: self.timestamp,
        }
    }
}

/// Record count and id counter, read under one lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub records: usize,
    pub next_id: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) records: BTreeMap<u64, StudentResult>,
    pub(crate) next_id: u64,
}

impl Inner {
    pub(crate) fn insert(&mut self, result: NewResult) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, result.into_record(id));
        debug!("Inserted result with ID {}", id);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> Result<(), StorageError> {
        match self.records.remove(&id) {
            Some(_) => {
                debug!("Deleted result with ID {}", id);
                Ok(())
            }
            None => Err(StorageError::NotFound(id)),
        }
    }

    pub(crate) fn clear(&mut self) {
        let removed = self.records.len();
        self.records.clear();
        self.next_id = 0;
        info!("Cleared {} result(s), id counter reset", removed);
    }

    pub(crate) fn stats(&self) -> StoreStats {
        StoreStats {
            records: self.records.len(),
            next_id: self.next_id,
        }
    }
}

/// Result store. Every operation takes the one lock, so each is applied
/// completely before the next begins.
pub struct ResultRepository {
    inner: Mutex<Inner>,
}

impl ResultRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        info!("Creating in-memory result repository");
        Self::from_inner(Inner::default())
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Store a result under the next id and return that id
    pub fn create(&self, result: NewResult) -> Result<u64, StorageError> {
        Ok(self.lock()?.insert(result))
    }

    /// Snapshot of all records in ascending id order
    pub fn list(&self) -> Result<Vec<StudentResult>, StorageError> {
        let inner = self.lock()?;
        Ok(inner.records.values().cloned().collect())
    }

    /// Remove one record
    pub fn delete(&self, id: u64) -> Result<(), StorageError> {
        self.lock()?.remove(id)
    }

    /// Remove every record and restart ids at zero
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Current record count and next id
    pub fn stats(&self) -> Result<StoreStats, StorageError> {
        Ok(self.lock()?.stats())
    }
}

impl Default for ResultRepository {
    fn default() -> Self {
        Self::new()
    }
}
