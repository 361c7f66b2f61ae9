//! Subject Marks

use serde::{Deserialize, Serialize};

/// Number of graded subjects
pub const SUBJECT_COUNT: usize = 5;

/// Graded subjects, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subject {
    Maths,
    Science,
    English,
    Tamil,
    ComputerScience,
}

impl Subject {
    /// All subjects in form order
    pub const ALL: [Subject; SUBJECT_COUNT] = [
        Subject::Maths,
        Subject::Science,
        Subject::English,
        Subject::Tamil,
        Subject::ComputerScience,
    ];

    /// Field name used on the wire and in validation messages
    pub fn field_name(self) -> &'static str {
        match self {
            Subject::Maths => "maths",
            Subject::Science => "science",
            Subject::English => "english",
            Subject::Tamil => "tamil",
            Subject::ComputerScience => "computerScience",
        }
    }
}

/// Marks for the five subjects of one student
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarks {
    pub maths: u32,
    pub science: u32,
    pub english: u32,
    pub tamil: u32,
    pub computer_science: u32,
}

impl SubjectMarks {
    pub fn new(maths: u32, science: u32, english: u32, tamil: u32, computer_science: u32) -> Self {
        Self {
            maths,
            science,
            english,
            tamil,
            computer_science,
        }
    }

    /// Mark for a single subject
    pub fn get(&self, subject: Subject) -> u32 {
        match subject {
            Subject::Maths => self.maths,
            Subject::Science => self.science,
            Subject::English => self.english,
            Subject::Tamil => self.tamil,
            Subject::ComputerScience => self.computer_science,
        }
    }

    /// `(subject, mark)` pairs in form order
    pub fn iter(&self) -> impl Iterator<Item = (Subject, u32)> + '_ {
        Subject::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Literal sum of the five marks
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, mark)| mark).sum()
    }

    /// `total / 5`, unrounded
    pub fn average(&self) -> f64 {
        f64::from(self.total()) / SUBJECT_COUNT as f64
    }

    /// Lowest single mark
    pub fn lowest(&self) -> u32 {
        self.iter().map(|(_, mark)| mark).min().unwrap_or(0)
    }
}

impl From<[u32; SUBJECT_COUNT]> for SubjectMarks {
    fn from(m: [u32; SUBJECT_COUNT]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4])
    }
}
