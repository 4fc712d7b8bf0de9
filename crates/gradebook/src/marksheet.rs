//! Marksheet assembly: catalog coverage, GPA and section rank.
//!
//! [`assemble`] and [`assemble_section`] are pure; the `load_*` functions
//! read the store one student at a time and hand the results to them.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::grading::{marking_scheme_of, Grade};
use crate::model::{ClassLevel, Exam, Group, Mark, Section, Student};
use crate::storage::Storage;

/// A peer's stored marks for the exam being ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerMarks {
    /// The peer.
    pub student_id: i64,
    /// Everything stored for the peer in this exam.
    pub marks: Vec<Mark>,
}

/// Pass or fail on a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultStatus {
    /// No failed subject and a GPA of at least 1.0.
    Pass,
    /// Anything else.
    Fail,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// A student's assembled result for one exam. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marksheet {
    /// The student.
    pub student: Student,
    /// Examination.
    pub exam: Exam,
    /// Group taken from the student's marks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    /// One mark per catalog subject, in catalog order.
    pub marks: Vec<Mark>,
    /// Mean grade point over entered marks.
    pub gpa: f64,
    /// Sum of grade points over entered marks.
    pub total_grade_points: f64,
    /// Number of catalog subjects.
    pub subjects: usize,
    /// 1-based position among ranked peers; `None` when unranked.
    pub section_rank: Option<usize>,
    /// Size of the ranking pool; `None` when nobody in the section is ranked.
    pub total_students_in_section: Option<usize>,
}

impl Marksheet {
    /// Whether any subject, placeholders included, is an F.
    #[must_use]
    pub fn has_failed_subject(&self) -> bool {
        self.marks.iter().any(|m| m.grade == Grade::F)
    }

    /// Overall result.
    #[must_use]
    pub fn status(&self) -> ResultStatus {
        if !self.has_failed_subject() && self.gpa >= 1.0 {
            ResultStatus::Pass
        } else {
            ResultStatus::Fail
        }
    }

    /// GPA as printed: zero when any subject failed.
    #[must_use]
    pub fn reported_gpa(&self) -> f64 {
        if self.has_failed_subject() {
            0.0
        } else {
            self.gpa
        }
    }

    /// Overall letter grade.
    #[must_use]
    pub fn overall_grade(&self) -> Grade {
        if self.has_failed_subject() {
            Grade::F
        } else {
            Grade::from_gpa(self.gpa)
        }
    }

    /// Sum of subject totals.
    #[must_use]
    pub fn total_obtained(&self) -> u32 {
        self.marks.iter().map(|m| m.total).sum()
    }

    /// Sum of subject full marks.
    #[must_use]
    pub fn total_possible(&self) -> u32 {
        self.marks
            .iter()
            .map(|m| marking_scheme_of(&m.subject).total)
            .sum()
    }
}

/// Mean grade point over marks with a nonzero total; 0 when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gpa_of(marks: &[Mark]) -> f64 {
    let entered: Vec<f64> = marks
        .iter()
        .filter(|m| m.is_entered())
        .map(|m| m.grade_point)
        .collect();
    if entered.is_empty() {
        0.0
    } else {
        entered.iter().sum::<f64>() / entered.len() as f64
    }
}

fn total_grade_points(marks: &[Mark]) -> f64 {
    marks
        .iter()
        .filter(|m| m.is_entered())
        .map(|m| m.grade_point)
        .sum()
}

/// The group carried by the first mark that has one.
#[must_use]
pub fn group_of(marks: &[Mark]) -> Option<Group> {
    marks.iter().find_map(|m| m.group)
}

/// Section ranking: peers with a nonzero GPA, best first.
///
/// Equal GPAs keep their input order and get consecutive positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    order: Vec<i64>,
}

impl Ranking {
    /// Rank `(student_id, gpa)` pairs.
    #[must_use]
    pub fn new(gpas: &[(i64, f64)]) -> Self {
        let mut pool: Vec<(i64, f64)> = gpas.iter().copied().filter(|(_, g)| *g > 0.0).collect();
        pool.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self {
            order: pool.into_iter().map(|(id, _)| id).collect(),
        }
    }

    /// 1-based position of a student, if ranked.
    #[must_use]
    pub fn rank_of(&self, student_id: i64) -> Option<usize> {
        self.order
            .iter()
            .position(|id| *id == student_id)
            .map(|i| i + 1)
    }

    /// Number of ranked students.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nobody is ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn pool_size(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.len())
    }
}

fn complete_marks(student: &Student, exam: Exam, marks: &[Mark], group: Option<Group>) -> Vec<Mark> {
    student
        .class
        .subjects(group)
        .into_iter()
        .map(|subject| {
            marks
                .iter()
                .find(|m| m.subject == subject)
                .cloned()
                .unwrap_or_else(|| Mark::placeholder(student, subject, exam, group))
        })
        .collect()
}

fn build(student: &Student, exam: Exam, marks: &[Mark], ranking: &Ranking) -> Marksheet {
    let group = group_of(marks);
    let complete = complete_marks(student, exam, marks, group);
    Marksheet {
        student: student.clone(),
        exam,
        group,
        subjects: complete.len(),
        marks: complete,
        gpa: gpa_of(marks),
        total_grade_points: total_grade_points(marks),
        section_rank: ranking.rank_of(student.id),
        total_students_in_section: ranking.pool_size(),
    }
}

/// Assemble one student's marksheet.
///
/// `marks` are the student's stored marks for `exam`; `section` holds the
/// stored marks of every student in the same class and section, the student
/// included.
#[must_use]
pub fn assemble(student: &Student, exam: Exam, marks: &[Mark], section: &[PeerMarks]) -> Marksheet {
    let gpas: Vec<(i64, f64)> = section
        .iter()
        .map(|p| (p.student_id, gpa_of(&p.marks)))
        .collect();
    build(student, exam, marks, &Ranking::new(&gpas))
}

/// Assemble a marksheet for every student in a section, sharing one ranking.
#[must_use]
pub fn assemble_section(exam: Exam, entries: &[(Student, Vec<Mark>)]) -> Vec<Marksheet> {
    let gpas: Vec<(i64, f64)> = entries
        .iter()
        .map(|(s, marks)| (s.id, gpa_of(marks)))
        .collect();
    let ranking = Ranking::new(&gpas);

    entries
        .iter()
        .map(|(student, marks)| build(student, exam, marks, &ranking))
        .collect()
}

/// Load and assemble the marksheet for the student at a roll.
///
/// # Errors
///
/// Returns [`Error::StudentNotFound`] if nobody holds the roll, or a storage error.
pub fn load_individual(
    storage: &Storage,
    class: ClassLevel,
    section: Section,
    roll: u32,
    exam: Exam,
) -> Result<Marksheet> {
    let student = storage
        .find_student(class, section, roll)?
        .ok_or(Error::StudentNotFound {
            roll,
            class,
            section,
        })?;

    let mut own = Vec::new();
    let mut peers = Vec::new();
    for peer in storage.students_in_section(class, section)? {
        let marks = storage.marks_for(peer.id, exam)?;
        if peer.id == student.id {
            own.clone_from(&marks);
        }
        peers.push(PeerMarks {
            student_id: peer.id,
            marks,
        });
    }

    debug!(
        "Assembling {} marksheet for student {} against {} peers",
        exam,
        student.id,
        peers.len()
    );
    Ok(assemble(&student, exam, &own, &peers))
}

/// Load and assemble marksheets for a whole section, ordered by roll.
///
/// An empty section yields no marksheets.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn load_section(
    storage: &Storage,
    class: ClassLevel,
    section: Section,
    exam: Exam,
) -> Result<Vec<Marksheet>> {
    let entries = storage
        .students_in_section(class, section)?
        .into_iter()
        .map(|student| {
            let marks = storage.marks_for(student.id, exam)?;
            Ok((student, marks))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Assembling {} marksheets for class {}{} ({})",
        entries.len(),
        class,
        section,
        exam
    );
    Ok(assemble_section(exam, &entries))
}
