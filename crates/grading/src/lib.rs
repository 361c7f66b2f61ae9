//! Grading
//!
//! Subject marks, the total/average/grade calculation and validation of
//! raw result forms before anything reaches the store.

mod error;
mod grade;
mod marks;
mod validator;

pub use error::ValidationError;
pub use grade::{calculate, Grade, GradeCalculator, GradeSummary, GradingConfig};
pub use marks::{Subject, SubjectMarks, SUBJECT_COUNT};
pub use validator::{FieldError, ResultForm, ValidForm, ValidationConfig, ValidationReport, Validator};
