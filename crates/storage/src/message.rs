//! Store Request/Response Messages

use crate::repository::{NewResult, ResultRepository, StudentResult};
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Opaque identity of whoever sent a request. Logged, never authorized on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallerId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations accepted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "camelCase")]
pub enum StoreRequest {
    AddResult(NewResult),
    GetResults,
    DeleteResult { id: u64 },
    ClearAll,
}

impl StoreRequest {
    /// Operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            StoreRequest::AddResult(_) => "addResult",
            StoreRequest::GetResults => "getResults",
            StoreRequest::DeleteResult { .. } => "deleteResult",
            StoreRequest::ClearAll => "clearAll",
        }
    }
}

/// Replies from the store. Writes carry the record count left behind,
/// read under the same lock as the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "camelCase")]
pub enum StoreResponse {
    Added { id: u64, records: usize },
    Results(Vec<StudentResult>),
    Ack { records: usize },
}

/// A request together with its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub caller: CallerId,
    pub request: StoreRequest,
}

impl Envelope {
    pub fn new(caller: CallerId, request: StoreRequest) -> Self {
        Self { caller, request }
    }

    pub fn anonymous(request: StoreRequest) -> Self {
        Self::new(CallerId::anonymous(), request)
    }
}

impl ResultRepository {
    /// Apply one request and produce its reply
    pub fn handle(&self, envelope: Envelope) -> Result<StoreResponse, StorageError> {
        let Envelope { caller, request } = envelope;
        let op = request.name();
        let mut inner = self.lock()?;

        let response = match request {
            StoreRequest::AddResult(result) => {
                let id = inner.insert(result);
                info!(caller = %caller, op, id, "Result added");
                StoreResponse::Added {
                    id,
                    records: inner.records.len(),
                }
            }
            StoreRequest::GetResults => {
                StoreResponse::Results(inner.records.values().cloned().collect())
            }
            StoreRequest::DeleteResult { id } => match inner.remove(id) {
                Ok(()) => {
                    info!(caller = %caller, op, id, "Result deleted");
                    StoreResponse::Ack {
                        records: inner.records.len(),
                    }
                }
                Err(e) => {
                    warn!(caller = %caller, op, id, "Delete failed: {e}");
                    return Err(e);
                }
            },
            StoreRequest::ClearAll => {
                inner.clear();
                info!(caller = %caller, op, "All results cleared");
                StoreResponse::Ack { records: 0 }
            }
        };

        Ok(response)
    }
}
