//! Result Form Validation

use crate::error::ValidationError;
use crate::marks::{Subject, SubjectMarks, SUBJECT_COUNT};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lowest accepted mark, inclusive
    pub min_mark: u32,
    /// Highest accepted mark, inclusive
    pub max_mark: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_mark: 0,
            max_mark: 100,
        }
    }
}

/// Raw form input, exactly as typed by the user.
///
/// Absent fields deserialize to empty strings. Marks may arrive as JSON
/// strings or numbers; either way they keep their textual form so that
/// parsing reports the same per-field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultForm {
    pub roll_number: String,
    pub student_name: String,
    #[serde(deserialize_with = "mark_text")]
    pub maths: String,
    #[serde(deserialize_with = "mark_text")]
    pub science: String,
    #[serde(deserialize_with = "mark_text")]
    pub english: String,
    #[serde(deserialize_with = "mark_text")]
    pub tamil: String,
    #[serde(deserialize_with = "mark_text")]
    pub computer_science: String,
}

fn mark_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct MarkText;

    impl<'de> Visitor<'de> for MarkText {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mark as a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        // Debug keeps the fraction (`90.0`), so floats fail integer parsing
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(format!("{v:?}"))
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(MarkText)
}

impl ResultForm {
    fn raw_mark(&self, subject: Subject) -> &str {
        match subject {
            Subject::Maths => &self.maths,
            Subject::Science => &self.science,
            Subject::English => &self.english,
            Subject::Tamil => &self.tamil,
            Subject::ComputerScience => &self.computer_science,
        }
    }
}

/// A form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForm {
    pub roll_number: String,
    pub student_name: String,
    pub marks: SubjectMarks,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        Self {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Every field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    fn check(errors: Vec<ValidationError>) -> Result<(), ValidationReport> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { errors })
        }
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors.iter().map(FieldError::from).collect()
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }
}

/// Validator for result forms and typed result fields
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a raw form, reporting every failing field
    pub fn validate_form(&self, form: &ResultForm) -> Result<ValidForm, ValidationReport> {
        let mut errors = self.identity_errors(&form.roll_number, &form.student_name);
        let marks = self.collect_marks(form, &mut errors);

        if !errors.is_empty() {
            debug!("Form rejected with {} field error(s)", errors.len());
        }
        ValidationReport::check(errors)?;

        Ok(ValidForm {
            roll_number: form.roll_number.trim().to_string(),
            student_name: form.student_name.trim().to_string(),
            marks,
        })
    }

    /// Parse only the five marks of a form; identity fields are not checked
    pub fn parse_marks(&self, form: &ResultForm) -> Result<SubjectMarks, ValidationReport> {
        let mut errors = Vec::new();
        let marks = self.collect_marks(form, &mut errors);
        ValidationReport::check(errors)?;
        Ok(marks)
    }

    /// Validate typed marks against the configured range
    pub fn validate_marks(&self, marks: &SubjectMarks) -> Result<(), ValidationReport> {
        ValidationReport::check(self.mark_errors(marks))
    }

    /// Parse one raw mark
    pub fn parse_mark(&self, field: &'static str, raw: &str) -> Result<u32, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingMark(field));
        }

        let value: i64 = raw.parse().map_err(|_| ValidationError::NotAnInteger {
            field,
            value: raw.to_string(),
        })?;

        self.validate_range(field, value)
    }

    fn validate_range(&self, field: &'static str, value: i64) -> Result<u32, ValidationError> {
        let (min, max) = (self.config.min_mark, self.config.max_mark);
        if value < i64::from(min) || value > i64::from(max) {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        } else {
            Ok(value as u32)
        }
    }

    fn collect_marks(&self, form: &ResultForm, errors: &mut Vec<ValidationError>) -> SubjectMarks {
        let mut parsed = [0u32; SUBJECT_COUNT];
        for (slot, subject) in parsed.iter_mut().zip(Subject::ALL) {
            match self.parse_mark(subject.field_name(), form.raw_mark(subject)) {
                Ok(mark) => *slot = mark,
                Err(e) => errors.push(e),
            }
        }
        SubjectMarks::from(parsed)
    }

    fn identity_errors(&self, roll_number: &str, student_name: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if roll_number.trim().is_empty() {
            errors.push(ValidationError::EmptyField("rollNumber"));
        }
        if student_name.trim().is_empty() {
            errors.push(ValidationError::EmptyField("studentName"));
        }
        errors
    }

    fn mark_errors(&self, marks: &SubjectMarks) -> Vec<ValidationError> {
        marks
            .iter()
            .filter_map(|(subject, mark)| {
                self.validate_range(subject.field_name(), i64::from(mark)).err()
            })
            .collect()
    }
}
