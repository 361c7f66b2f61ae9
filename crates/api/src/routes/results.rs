//! Result Routes

use axum::{extract::State, http::StatusCode, Json};
use grading::{Grade, GradeSummary, ResultForm, SubjectMarks};
use serde::{Deserialize, Serialize};
use storage::{Envelope, NewResult, StorageError, StoreRequest, StoreResponse, StudentResult};
use tracing::warn;

use crate::caller::Caller;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::telemetry;
use crate::SharedState;

/// Body of addResult. Identity and marks are read leniently so that a
/// missing or malformed mark is reported per field; the derived fields
/// must be well-typed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResultRequest {
    #[serde(flatten)]
    pub form: ResultForm,
    pub total: u32,
    pub average: f64,
    pub grade: Grade,
    /// Milliseconds since epoch; the server clock is used when absent
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl AddResultRequest {
    fn summary(&self) -> GradeSummary {
        GradeSummary {
            total: self.total,
            average: self.average,
            grade: self.grade,
        }
    }

    fn into_new_result(self, marks: SubjectMarks) -> NewResult {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let summary = self.summary();
        NewResult::from_summary(
            self.form.roll_number,
            self.form.student_name,
            marks,
            summary,
            timestamp,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddResultResponse {
    pub id: u64,
}

/// Response for getResults
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub data: Vec<StudentResult>,
    pub count: usize,
}

/// Store a new result
pub async fn add_result(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<AddResultRequest>,
) -> Result<(StatusCode, Json<AddResultResponse>), ApiError> {
    let marks = if state.verify_derived {
        verify(&state, &body)?
    } else {
        state.validator.parse_marks(&body.form)?
    };

    let request = StoreRequest::AddResult(body.into_new_result(marks));
    let StoreResponse::Added { id, records } =
        state.repository.handle(Envelope::new(caller, request))?
    else {
        return Err(ApiError::UnexpectedResponse("addResult"));
    };

    metrics::counter!(telemetry::RESULTS_CREATED).increment(1);
    record_gauge(records);
    Ok((StatusCode::CREATED, Json(AddResultResponse { id })))
}

/// List all results, ascending id
pub async fn get_results(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<Json<ResultsResponse>, ApiError> {
    let StoreResponse::Results(data) = state
        .repository
        .handle(Envelope::new(caller, StoreRequest::GetResults))?
    else {
        return Err(ApiError::UnexpectedResponse("getResults"));
    };

    Ok(Json(ResultsResponse {
        count: data.len(),
        data,
    }))
}

/// Delete one result
pub async fn delete_result(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    ApiPath(id): ApiPath<u64>,
) -> Result<StatusCode, ApiError> {
    let outcome = state
        .repository
        .handle(Envelope::new(caller, StoreRequest::DeleteResult { id }));

    match outcome {
        Ok(StoreResponse::Ack { records }) => {
            metrics::counter!(telemetry::RESULTS_DELETED).increment(1);
            record_gauge(records);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(_) => Err(ApiError::UnexpectedResponse("deleteResult")),
        Err(e @ StorageError::NotFound(_)) => {
            metrics::counter!(telemetry::DELETE_NOT_FOUND).increment(1);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete every result and reset ids
pub async fn clear_all(
    State(state): State<SharedState>,
    Caller(caller): Caller,
) -> Result<StatusCode, ApiError> {
    let StoreResponse::Ack { records } = state
        .repository
        .handle(Envelope::new(caller, StoreRequest::ClearAll))?
    else {
        return Err(ApiError::UnexpectedResponse("clearAll"));
    };

    metrics::counter!(telemetry::RESULTS_CLEARED).increment(1);
    record_gauge(records);
    Ok(StatusCode::NO_CONTENT)
}

/// Validate identity and marks, then check the supplied derived fields
/// against the recomputed ones
fn verify(state: &SharedState, body: &AddResultRequest) -> Result<SubjectMarks, ApiError> {
    let valid = match state.validator.validate_form(&body.form) {
        Ok(valid) => valid,
        Err(report) => {
            metrics::counter!(telemetry::VERIFICATION_REJECTED).increment(1);
            return Err(report.into());
        }
    };

    let expected = state.calculator.summarize(&valid.marks);
    let supplied = body.summary();
    if !expected.matches(&supplied) {
        metrics::counter!(telemetry::VERIFICATION_REJECTED).increment(1);
        warn!(
            roll_number = %valid.roll_number,
            "Rejected result with derived fields {:?}, expected {:?}",
            supplied, expected
        );
        return Err(ApiError::Inconsistent { expected, supplied });
    }

    Ok(valid.marks)
}

fn record_gauge(records: usize) {
    metrics::gauge!(telemetry::RECORDS).set(records as f64);
}
