//! Grading table: percentage to letter grade, and per-subject marking schemes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Scores;

/// Subjects examined on the written paper alone.
const WRITTEN_ONLY_SUBJECTS: &[&str] = &["English 1st Paper", "English 2nd Paper"];

/// Subjects with a practical component.
const PRACTICAL_SUBJECTS: &[&str] = &[
    "Higher Math / Agriculture",
    "Higher Math",
    "Physics",
    "Chemistry",
    "Biology",
];

/// A letter grade together with its grade point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// 80 and above.
    #[serde(rename = "A+")]
    APlus,
    /// 70 to 79.
    A,
    /// 60 to 69.
    #[serde(rename = "A-")]
    AMinus,
    /// 50 to 59.
    B,
    /// 40 to 49.
    C,
    /// 33 to 39.
    D,
    /// Below 33.
    F,
}

impl Grade {
    /// Every grade, best first.
    pub const ALL: [Grade; 7] = [
        Self::APlus,
        Self::A,
        Self::AMinus,
        Self::B,
        Self::C,
        Self::D,
        Self::F,
    ];

    /// The printed letter.
    #[must_use]
    pub fn letter(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// The grade point on the 5.0 scale.
    #[must_use]
    pub fn grade_point(self) -> f64 {
        match self {
            Self::APlus => 5.0,
            Self::A => 4.0,
            Self::AMinus => 3.5,
            Self::B => 3.0,
            Self::C => 2.0,
            Self::D => 1.0,
            Self::F => 0.0,
        }
    }

    /// Overall letter for a grade point average.
    ///
    /// The first band whose grade point the average reaches wins.
    #[must_use]
    pub fn from_gpa(gpa: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|g| *g != Self::F && gpa >= g.grade_point())
            .unwrap_or(Self::F)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.letter())
    }
}

impl FromStr for Grade {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.letter() == s.trim())
            .ok_or_else(|| Error::invalid("grade", s))
    }
}

/// Grade for a percentage score.
///
/// Breakpoints are inclusive on their lower bound. Anything below 33,
/// including negative or NaN input, is an F.
#[must_use]
pub fn grade_of(percentage: f64) -> Grade {
    if percentage >= 80.0 {
        Grade::APlus
    } else if percentage >= 70.0 {
        Grade::A
    } else if percentage >= 60.0 {
        Grade::AMinus
    } else if percentage >= 50.0 {
        Grade::B
    } else if percentage >= 40.0 {
        Grade::C
    } else if percentage >= 33.0 {
        Grade::D
    } else {
        Grade::F
    }
}

/// The printable grading legend: mark band and the grade it earns.
pub const GRADING_SCALE: [(&str, Grade); 7] = [
    ("80-100", Grade::APlus),
    ("70-79", Grade::A),
    ("60-69", Grade::AMinus),
    ("50-59", Grade::B),
    ("40-49", Grade::C),
    ("33-39", Grade::D),
    ("0-32", Grade::F),
];

/// One scored component of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Written paper.
    Written,
    /// Multiple-choice paper.
    Mcq,
    /// Practical work.
    Practical,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => f.write_str("Written"),
            Self::Mcq => f.write_str("MCQ"),
            Self::Practical => f.write_str("Practical"),
        }
    }
}

/// Maximum marks per component for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingScheme {
    /// Written paper maximum.
    pub written: u32,
    /// MCQ paper maximum.
    pub mcq: u32,
    /// Practical maximum.
    pub practical: u32,
    /// Always 100.
    pub total: u32,
}

impl MarkingScheme {
    const fn new(written: u32, mcq: u32, practical: u32) -> Self {
        Self {
            written,
            mcq,
            practical,
            total: 100,
        }
    }

    /// Maximum for one component.
    #[must_use]
    pub fn max_for(&self, component: Component) -> u32 {
        match component {
            Component::Written => self.written,
            Component::Mcq => self.mcq,
            Component::Practical => self.practical,
        }
    }

    /// Every component of `scores` that exceeds its maximum, one line each.
    ///
    /// A component with a maximum of zero only accepts zero.
    #[must_use]
    pub fn check(&self, student_name: &str, scores: Scores) -> Vec<String> {
        [
            (Component::Written, scores.theory),
            (Component::Mcq, scores.mcq),
            (Component::Practical, scores.practical),
        ]
        .into_iter()
        .filter(|(component, score)| *score > self.max_for(*component))
        .map(|(component, score)| {
            format!(
                "{student_name}: {component} marks ({score}) exceed maximum ({})",
                self.max_for(component)
            )
        })
        .collect()
    }
}

/// Marking scheme for a subject.
///
/// English papers are written-only; practical subjects split 50/25/25;
/// everything else is 70 written and 30 MCQ.
#[must_use]
pub fn marking_scheme_of(subject: &str) -> MarkingScheme {
    if WRITTEN_ONLY_SUBJECTS.contains(&subject) {
        MarkingScheme::new(100, 0, 0)
    } else if PRACTICAL_SUBJECTS.contains(&subject) {
        MarkingScheme::new(50, 25, 25)
    } else {
        MarkingScheme::new(70, 30, 0)
    }
}

/// Grade a subject total against the subject's full marks.
#[must_use]
pub fn grade_total(subject: &str, total: u32) -> Grade {
    let scheme = marking_scheme_of(subject);
    let percentage = f64::from(total) / f64::from(scheme.total) * 100.0;
    grade_of(percentage)
}
