//! Grade Preview Route
//!
//! Lets a form validate raw input and compute the derived fields with the
//! server's thresholds before it submits addResult.

use axum::{extract::State, Json};
use grading::{GradeSummary, ResultForm, SubjectMarks};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::SharedState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePreview {
    pub roll_number: String,
    pub student_name: String,
    #[serde(flatten)]
    pub marks: SubjectMarks,
    #[serde(flatten)]
    pub summary: GradeSummary,
}

/// Validate a raw form and grade it
pub async fn preview_grade(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<ResultForm>,
) -> Result<Json<GradePreview>, ApiError> {
    let valid = state.validator.validate_form(&form)?;
    let summary = state.calculator.summarize(&valid.marks);

    Ok(Json(GradePreview {
        roll_number: valid.roll_number,
        student_name: valid.student_name,
        marks: valid.marks,
        summary,
    }))
}
