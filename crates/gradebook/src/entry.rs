//! Mark entry for one subject across a class section.
//!
//! A batch is validated as a whole before anything is written. Once it
//! passes, each row is an independent upsert: a store failure part-way
//! through leaves the earlier rows saved.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog;
use crate::error::{Error, Result};
use crate::grading::{marking_scheme_of, MarkingScheme};
use crate::model::{ClassLevel, Exam, Group, Mark, Scores, Section, Student};
use crate::storage::Storage;

/// What a batch of marks is being entered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCriteria {
    /// Examination.
    pub exam: Exam,
    /// Class.
    pub class: ClassLevel,
    /// Section.
    pub section: Section,
    /// Group; always `None` for classes 6 to 8.
    pub group: Option<Group>,
    /// Catalog subject.
    pub subject: String,
}

impl EntryCriteria {
    /// Validate entry criteria.
    ///
    /// A group is required for classes 9 and 10 and dropped for the others.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupRequired`], [`Error::MissingField`] or
    /// [`Error::SubjectNotInCatalog`].
    pub fn new(
        exam: Exam,
        class: ClassLevel,
        section: Section,
        group: Option<Group>,
        subject: &str,
    ) -> Result<Self> {
        let group = if class.requires_group() {
            Some(group.ok_or(Error::GroupRequired { class })?)
        } else {
            None
        };

        let subject = subject.trim();
        if subject.is_empty() {
            return Err(Error::MissingField { field: "subject" });
        }
        if !catalog::contains(class, group, subject) {
            return Err(Error::SubjectNotInCatalog {
                subject: subject.to_string(),
                class,
            });
        }

        Ok(Self {
            exam,
            class,
            section,
            group,
            subject: subject.to_string(),
        })
    }

    /// Marking scheme of the subject being entered.
    #[must_use]
    pub fn scheme(&self) -> MarkingScheme {
        marking_scheme_of(&self.subject)
    }
}

/// One student's line on an entry sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    /// The student.
    pub student: Student,
    /// Scores to save.
    pub scores: Scores,
}

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    /// Marks stored for the first time.
    pub inserted: usize,
    /// Marks that replaced an earlier entry.
    pub updated: usize,
}

impl SaveSummary {
    /// Marks written in total.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.inserted + self.updated
    }
}

/// The section roster sorted by roll, with any scores already stored for
/// this subject and exam (zero otherwise).
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn entry_sheet(storage: &Storage, criteria: &EntryCriteria) -> Result<Vec<ScoreRow>> {
    storage
        .students_in_section(criteria.class, criteria.section)?
        .into_iter()
        .map(|student| {
            let scores = storage
                .get_mark(student.id, &criteria.subject, criteria.exam)?
                .map(|m| m.scores())
                .unwrap_or_default();
            Ok(ScoreRow { student, scores })
        })
        .collect()
}

/// Pair entered scores with the students holding those rolls in the section.
///
/// # Errors
///
/// Returns [`Error::StudentNotFound`] for a roll nobody holds.
pub fn resolve_rolls(
    storage: &Storage,
    criteria: &EntryCriteria,
    entries: &[(u32, Scores)],
) -> Result<Vec<ScoreRow>> {
    entries
        .iter()
        .map(|&(roll, scores)| {
            let student = storage
                .find_student(criteria.class, criteria.section, roll)?
                .ok_or(Error::StudentNotFound {
                    roll,
                    class: criteria.class,
                    section: criteria.section,
                })?;
            Ok(ScoreRow { student, scores })
        })
        .collect()
}

/// Check every row against the subject's marking scheme and section.
///
/// # Errors
///
/// Returns [`Error::ScoresOutOfRange`] listing every violation, or
/// [`Error::InvalidValue`] for a student outside the criteria's section.
pub fn validate(criteria: &EntryCriteria, rows: &[ScoreRow]) -> Result<()> {
    if let Some(stray) = rows
        .iter()
        .find(|r| r.student.class != criteria.class || r.student.section != criteria.section)
    {
        return Err(Error::invalid(
            "student",
            format!(
                "{} is in class {}{}, not {}{}",
                stray.student.name,
                stray.student.class,
                stray.student.section,
                criteria.class,
                criteria.section
            ),
        ));
    }

    let scheme = criteria.scheme();
    let violations: Vec<String> = rows
        .iter()
        .flat_map(|r| scheme.check(&r.student.name, r.scores))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::ScoresOutOfRange { violations })
    }
}

/// Validate and save a batch of scores.
///
/// # Errors
///
/// Validation errors abort before any write. A storage error aborts the
/// remaining rows; rows already saved stay saved.
pub fn save_marks(
    storage: &Storage,
    criteria: &EntryCriteria,
    rows: &[ScoreRow],
) -> Result<SaveSummary> {
    validate(criteria, rows)?;

    let mut summary = SaveSummary::default();
    for row in rows {
        let existing = storage.get_mark(row.student.id, &criteria.subject, criteria.exam)?;
        let mark = Mark::graded(
            &row.student,
            &criteria.subject,
            criteria.exam,
            criteria.group,
            row.scores,
        );
        debug!(
            "Roll {}: total {} grade {}",
            row.student.roll, mark.total, mark.grade
        );
        storage.upsert_mark(&mark)?;
        if existing.is_some() {
            summary.updated += 1;
        } else {
            summary.inserted += 1;
        }
    }

    info!(
        "Saved {} {} marks for class {}{} ({}): {} new, {} updated",
        summary.saved(),
        criteria.subject,
        criteria.class,
        criteria.section,
        criteria.exam,
        summary.inserted,
        summary.updated
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;
    use crate::model::NewStudent;
    use crate::registry;

    fn setup() -> (Storage, Vec<Student>) {
        let storage = Storage::open_in_memory().unwrap();
        let students = [("Ayesha", 5), ("Rahim", 2), ("Karim", 9)]
            .into_iter()
            .map(|(name, roll)| {
                registry::register(
                    &storage,
                    &NewStudent::new(name, roll, ClassLevel::Nine, Section::A).unwrap(),
                )
                .unwrap()
            })
            .collect();
        (storage, students)
    }

    fn physics() -> EntryCriteria {
        EntryCriteria::new(
            Exam::Yearly,
            ClassLevel::Nine,
            Section::A,
            Some(Group::Science),
            "Physics",
        )
        .unwrap()
    }

    #[test]
    fn test_criteria_require_group_for_secondary() {
        let err = EntryCriteria::new(Exam::Yearly, ClassLevel::Ten, Section::A, None, "Physics")
            .unwrap_err();
        assert!(matches!(err, Error::GroupRequired { .. }));
    }

    #[test]
    fn test_criteria_drop_group_for_junior() {
        let criteria = EntryCriteria::new(
            Exam::Yearly,
            ClassLevel::Seven,
            Section::A,
            Some(Group::Science),
            "Mathematics",
        )
        .unwrap();
        assert_eq!(criteria.group, None);
    }

    #[test]
    fn test_criteria_reject_subject_outside_catalog() {
        let err = EntryCriteria::new(
            Exam::Yearly,
            ClassLevel::Nine,
            Section::A,
            Some(Group::Humanities),
            "Physics",
        )
        .unwrap_err();
        assert!(matches!(err, Error::SubjectNotInCatalog { .. }));
    }

    #[test]
    fn test_criteria_reject_blank_subject() {
        let err = EntryCriteria::new(Exam::Yearly, ClassLevel::Six, Section::A, None, "  ")
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "subject" }));
    }

    #[test]
    fn test_entry_sheet_is_sorted_by_roll_and_zeroed() {
        let (storage, _) = setup();
        let sheet = entry_sheet(&storage, &physics()).unwrap();
        let rolls: Vec<u32> = sheet.iter().map(|r| r.student.roll).collect();
        assert_eq!(rolls, vec![2, 5, 9]);
        assert!(sheet.iter().all(|r| r.scores == Scores::default()));
    }

    #[test]
    fn test_entry_sheet_shows_stored_scores() {
        let (storage, students) = setup();
        let criteria = physics();
        save_marks(
            &storage,
            &criteria,
            &[ScoreRow {
                student: students[0].clone(),
                scores: Scores::new(45, 20, 20),
            }],
        )
        .unwrap();

        let sheet = entry_sheet(&storage, &criteria).unwrap();
        let ayesha = sheet.iter().find(|r| r.student.roll == 5).unwrap();
        assert_eq!(ayesha.scores, Scores::new(45, 20, 20));
    }

    #[test]
    fn test_save_physics_scenario() {
        let (storage, students) = setup();
        let summary = save_marks(
            &storage,
            &physics(),
            &[ScoreRow {
                student: students[0].clone(),
                scores: Scores::new(45, 20, 20),
            }],
        )
        .unwrap();
        assert_eq!(
            summary,
            SaveSummary {
                inserted: 1,
                updated: 0
            }
        );

        let mark = storage
            .get_mark(students[0].id, "Physics", Exam::Yearly)
            .unwrap()
            .unwrap();
        assert_eq!(mark.total, 85);
        assert_eq!(mark.grade, Grade::APlus);
        assert!((mark.grade_point - 5.0).abs() < f64::EPSILON);
        assert_eq!(mark.group, Some(Group::Science));
    }

    #[test]
    fn test_save_aborts_whole_batch_on_any_violation() {
        let (storage, students) = setup();
        let rows = vec![
            ScoreRow {
                student: students[0].clone(),
                scores: Scores::new(45, 20, 20),
            },
            ScoreRow {
                student: students[1].clone(),
                scores: Scores::new(60, 30, 20),
            },
        ];

        let err = save_marks(&storage, &physics(), &rows).unwrap_err();
        match err {
            Error::ScoresOutOfRange { violations } => {
                assert_eq!(violations.len(), 2);
                assert!(violations[0].starts_with("Rahim: Written"));
                assert!(violations[1].starts_with("Rahim: MCQ"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(storage.count_marks().unwrap(), 0);
    }

    #[test]
    fn test_resaving_overwrites() {
        let (storage, students) = setup();
        let criteria = physics();
        let summaries: Vec<SaveSummary> = [Scores::new(10, 5, 5), Scores::new(40, 20, 20)]
            .into_iter()
            .map(|scores| {
                save_marks(
                    &storage,
                    &criteria,
                    &[ScoreRow {
                        student: students[0].clone(),
                        scores,
                    }],
                )
                .unwrap()
            })
            .collect();

        assert_eq!(summaries[0].inserted, 1);
        assert_eq!(summaries[1].updated, 1);
        assert_eq!(storage.count_marks().unwrap(), 1);
        let mark = storage
            .get_mark(students[0].id, "Physics", Exam::Yearly)
            .unwrap()
            .unwrap();
        assert_eq!(mark.total, 80);
    }

    #[test]
    fn test_resolve_rolls() {
        let (storage, _) = setup();
        let rows = resolve_rolls(&storage, &physics(), &[(9, Scores::new(30, 10, 10))]).unwrap();
        assert_eq!(rows[0].student.name, "Karim");

        let err = resolve_rolls(&storage, &physics(), &[(42, Scores::default())]).unwrap_err();
        assert!(matches!(err, Error::StudentNotFound { roll: 42, .. }));
    }

    #[test]
    fn test_validate_rejects_student_from_other_section() {
        let (storage, _) = setup();
        let outsider = registry::register(
            &storage,
            &NewStudent::new("Outsider", 1, ClassLevel::Nine, Section::B).unwrap(),
        )
        .unwrap();

        let err = validate(
            &physics(),
            &[ScoreRow {
                student: outsider,
                scores: Scores::default(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { field: "student", .. }));
    }
}
