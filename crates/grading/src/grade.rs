//! Grade Calculation

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::marks::SubjectMarks;

/// Tolerance when comparing a caller-supplied average against a recomputed one
const AVERAGE_TOLERANCE: f64 = 1e-9;

/// Letter classification of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    Fail,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::Fail => "Fail",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grading thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Any single mark below this fails the student outright
    pub subject_pass_mark: u32,
    /// Average below this fails the student
    pub average_pass_mark: f64,
    /// Minimum average for an A
    pub grade_a_min: f64,
    /// Minimum average for a B
    pub grade_b_min: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            subject_pass_mark: 35,
            average_pass_mark: 40.0,
            grade_a_min: 80.0,
            grade_b_min: 60.0,
        }
    }
}

/// Derived fields of a result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub total: u32,
    pub average: f64,
    pub grade: Grade,
}

impl GradeSummary {
    /// Whether `other` carries the same derived values
    pub fn matches(&self, other: &GradeSummary) -> bool {
        self.total == other.total
            && self.grade == other.grade
            && (self.average - other.average).abs() <= AVERAGE_TOLERANCE
    }
}

/// Computes total, average and grade from subject marks
#[derive(Debug, Clone, Default)]
pub struct GradeCalculator {
    config: GradingConfig,
}

impl GradeCalculator {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    /// Classify marks. A failing subject short-circuits to `Fail` before
    /// the average thresholds are considered.
    pub fn grade(&self, marks: &SubjectMarks) -> Grade {
        if marks.lowest() < self.config.subject_pass_mark {
            return Grade::Fail;
        }

        let average = marks.average();
        if average < self.config.average_pass_mark {
            Grade::Fail
        } else if average >= self.config.grade_a_min {
            Grade::A
        } else if average >= self.config.grade_b_min {
            Grade::B
        } else {
            Grade::C
        }
    }

    /// Total, average and grade in one pass
    pub fn summarize(&self, marks: &SubjectMarks) -> GradeSummary {
        let summary = GradeSummary {
            total: marks.total(),
            average: marks.average(),
            grade: self.grade(marks),
        };
        debug!(
            "Graded marks {:?}: total={} average={} grade={}",
            marks, summary.total, summary.average, summary.grade
        );
        summary
    }
}

/// Summarize marks with the default thresholds
pub fn calculate(marks: &SubjectMarks) -> GradeSummary {
    GradeCalculator::default().summarize(marks)
}
