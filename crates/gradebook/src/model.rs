//! Core record types for gradebook.
//!
//! Class, section, exam and group are closed sets; they are parsed once at the
//! boundary and travel through the rest of the crate as enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grading::{self, Grade};

/// Lowercase and drop separators so "half-yearly", "Half Yearly" and
/// "HALF_YEARLY" compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A class (grade level) served by the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClassLevel {
    /// Class 6.
    Six,
    /// Class 7.
    Seven,
    /// Class 8.
    Eight,
    /// Class 9.
    Nine,
    /// Class 10.
    Ten,
}

impl ClassLevel {
    /// Every class, lowest first.
    pub const ALL: [ClassLevel; 5] = [
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
    ];

    /// The class number as printed on a transcript.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten => 10,
        }
    }

    /// Classes 9 and 10 study a group-specific curriculum.
    #[must_use]
    pub fn requires_group(self) -> bool {
        matches!(self, Self::Nine | Self::Ten)
    }
}

impl TryFrom<u8> for ClassLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            9 => Ok(Self::Nine),
            10 => Ok(Self::Ten),
            other => Err(Error::invalid("class", other.to_string())),
        }
    }
}

impl From<ClassLevel> for u8 {
    fn from(class: ClassLevel) -> Self {
        class.number()
    }
}

impl FromStr for ClassLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let n: u8 = s.trim().parse().map_err(|_| Error::invalid("class", s))?;
        Self::try_from(n)
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.number(), f)
    }
}

/// A section within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    /// Section A.
    A,
    /// Section B.
    B,
}

impl Section {
    /// Every section.
    pub const ALL: [Section; 2] = [Self::A, Self::B];

    /// The section letter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            _ => Err(Error::invalid("section", s)),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The examination a mark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exam {
    /// Mid-year examination.
    #[serde(rename = "Half-Yearly")]
    HalfYearly,
    /// End-of-year examination.
    Yearly,
}

impl Exam {
    /// Both examinations in calendar order.
    pub const ALL: [Exam; 2] = [Self::HalfYearly, Self::Yearly];

    /// The exam name used in storage and on transcripts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HalfYearly => "Half-Yearly",
            Self::Yearly => "Yearly",
        }
    }
}

impl FromStr for Exam {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "halfyearly" => Ok(Self::HalfYearly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(Error::invalid("exam", s)),
        }
    }
}

impl fmt::Display for Exam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Curriculum stream chosen by students in classes 9 and 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Science stream.
    Science,
    /// Business studies stream.
    #[serde(rename = "Business Studies")]
    BusinessStudies,
    /// Humanities stream.
    Humanities,
}

impl Group {
    /// Every group in the order the catalog lists them.
    pub const ALL: [Group; 3] = [Self::Science, Self::BusinessStudies, Self::Humanities];

    /// The group name used in storage and on transcripts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Science => "Science",
            Self::BusinessStudies => "Business Studies",
            Self::Humanities => "Humanities",
        }
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "science" => Ok(Self::Science),
            "businessstudies" | "business" => Ok(Self::BusinessStudies),
            "humanities" => Ok(Self::Humanities),
            _ => Err(Error::invalid("group", s)),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Identifier assigned by the storage layer.
    pub id: i64,
    /// Full name.
    pub name: String,
    /// Roll number, unique within class and section.
    pub roll: u32,
    /// Class the student is enrolled in.
    pub class: ClassLevel,
    /// Section within the class.
    pub section: Section,
    /// When the student was registered.
    pub created_at: DateTime<Utc>,
}

/// A validated registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Positive roll number.
    pub roll: u32,
    /// Class to enrol in.
    pub class: ClassLevel,
    /// Section to enrol in.
    pub section: Section,
}

impl NewStudent {
    /// Validate registration input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] for a blank name and
    /// [`Error::InvalidValue`] for a roll of zero.
    pub fn new(name: &str, roll: u32, class: ClassLevel, section: Section) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MissingField { field: "name" });
        }
        if roll == 0 {
            return Err(Error::invalid("roll", "0"));
        }
        Ok(Self {
            name: name.to_string(),
            roll,
            class,
            section,
        })
    }
}

/// Raw component scores as entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    /// Written (theory) component.
    pub theory: u32,
    /// Multiple-choice component.
    pub mcq: u32,
    /// Practical component.
    pub practical: u32,
}

impl Scores {
    /// Build a score triple.
    #[must_use]
    pub fn new(theory: u32, mcq: u32, practical: u32) -> Self {
        Self {
            theory,
            mcq,
            practical,
        }
    }

    /// Sum of the three components.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.theory + self.mcq + self.practical
    }
}

/// One subject result for one student in one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    /// Identifier assigned by the storage layer; `None` for placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The student this mark belongs to.
    pub student_id: i64,
    /// Subject name from the catalog.
    pub subject: String,
    /// Examination.
    pub exam: Exam,
    /// Class at the time of entry.
    pub class: ClassLevel,
    /// Section at the time of entry.
    pub section: Section,
    /// Group at the time of entry; always `None` for classes 6-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    /// Written component.
    pub theory: u32,
    /// Multiple-choice component.
    pub mcq: u32,
    /// Practical component.
    pub practical: u32,
    /// `theory + mcq + practical`.
    pub total: u32,
    /// Letter grade derived from the total.
    pub grade: Grade,
    /// Grade point derived from the total.
    pub grade_point: f64,
}

impl Mark {
    /// Grade a set of scores for a student and subject.
    #[must_use]
    pub fn graded(
        student: &Student,
        subject: &str,
        exam: Exam,
        group: Option<Group>,
        scores: Scores,
    ) -> Self {
        let total = scores.total();
        let grade = grading::grade_total(subject, total);
        Self {
            id: None,
            student_id: student.id,
            subject: subject.to_string(),
            exam,
            class: student.class,
            section: student.section,
            group,
            theory: scores.theory,
            mcq: scores.mcq,
            practical: scores.practical,
            total,
            grade,
            grade_point: grade.grade_point(),
        }
    }

    /// Zero-score stand-in for a catalog subject with no stored entry.
    #[must_use]
    pub fn placeholder(student: &Student, subject: &str, exam: Exam, group: Option<Group>) -> Self {
        Self {
            id: None,
            student_id: student.id,
            subject: subject.to_string(),
            exam,
            class: student.class,
            section: student.section,
            group,
            theory: 0,
            mcq: 0,
            practical: 0,
            total: 0,
            grade: Grade::F,
            grade_point: 0.0,
        }
    }

    /// The component scores of this mark.
    #[must_use]
    pub fn scores(&self) -> Scores {
        Scores::new(self.theory, self.mcq, self.practical)
    }

    /// Whether any score was entered (placeholders and all-zero entries are not).
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.total > 0
    }
}
