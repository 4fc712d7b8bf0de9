//! Bulk roster export and import.
//!
//! The interchange file is a JSON array of `{name, roll, class, section,
//! group?}` rows. Import never touches marks.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ClassLevel, Group, NewStudent, Section};
use crate::storage::{Storage, StudentFilter};

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    /// Student name.
    pub name: String,
    /// Roll number.
    pub roll: u32,
    /// Class.
    pub class: ClassLevel,
    /// Section.
    pub section: Section,
    /// Group from the student's marks; informational, ignored on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
}

/// What to do with the students already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Remove every student, then insert the file's rows.
    Replace,
    /// Keep existing students and add rows not already present.
    Merge,
}

impl fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Merge => f.write_str("merge"),
        }
    }
}

/// What an import did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Policy applied.
    pub policy: ImportPolicy,
    /// Distinct rows read from the file.
    pub rows: usize,
    /// Students removed before inserting (replace only).
    pub removed: usize,
    /// Students inserted.
    pub inserted: usize,
    /// Rows already registered under the same name, roll, class and section.
    pub unchanged: usize,
    /// Rows whose roll is held by a different student (merge only).
    pub conflicts: usize,
}

/// Identity used to de-duplicate rows: name, roll, class and section.
fn key(form: &NewStudent) -> (String, u32, ClassLevel, Section) {
    (form.name.clone(), form.roll, form.class, form.section)
}

/// Every registered student as a roster row, ordered by class, section and roll.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn export(storage: &Storage) -> Result<Vec<RosterRow>> {
    storage
        .list_students(StudentFilter::default())?
        .into_iter()
        .map(|s| {
            Ok(RosterRow {
                group: storage.student_group(s.id)?,
                name: s.name,
                roll: s.roll,
                class: s.class,
                section: s.section,
            })
        })
        .collect()
}

/// Parse roster JSON into validated registration forms.
///
/// Duplicate rows (same name, roll, class and section) collapse into the first.
///
/// # Errors
///
/// Returns [`Error::ImportFormat`] for malformed JSON, a wrong shape, or a
/// row with a blank name, a zero roll, or an unknown class or section.
pub fn parse(bytes: &[u8]) -> Result<Vec<NewStudent>> {
    let rows: Vec<RosterRow> = serde_json::from_slice(bytes)
        .map_err(|e| Error::import_format(format!("not a roster: {e}")))?;

    let mut seen = HashSet::new();
    let mut forms = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let form = NewStudent::new(&row.name, row.roll, row.class, row.section)
            .map_err(|e| Error::import_format(format!("row {}: {e}", i + 1)))?;
        if seen.insert(key(&form)) {
            forms.push(form);
        } else {
            debug!("Dropping duplicate roster row {}", i + 1);
        }
    }

    debug!("Parsed {} roster rows ({} distinct)", rows.len(), forms.len());
    Ok(forms)
}

/// Read and parse a roster file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or see [`parse`].
pub fn read_file(path: &Path) -> Result<Vec<NewStudent>> {
    parse(&fs::read(path)?)
}

/// Write roster rows as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_file(path: &Path, rows: &[RosterRow]) -> Result<()> {
    fs::write(path, to_json(rows)?)?;
    Ok(())
}

/// Roster rows as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(rows: &[RosterRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Apply parsed rows under a policy.
///
/// # Errors
///
/// Under [`ImportPolicy::Replace`], two rows claiming the same roll in one
/// class and section is an [`Error::ImportFormat`] and nothing is changed.
/// Storage errors propagate; a replace is rolled back as a whole.
pub fn import(storage: &Storage, forms: &[NewStudent], policy: ImportPolicy) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        policy,
        rows: forms.len(),
        removed: 0,
        inserted: 0,
        unchanged: 0,
        conflicts: 0,
    };

    match policy {
        ImportPolicy::Replace => {
            let mut slots = HashSet::new();
            for form in forms {
                if !slots.insert((form.class, form.section, form.roll)) {
                    return Err(Error::import_format(format!(
                        "roll {} appears twice in class {}{}",
                        form.roll, form.class, form.section
                    )));
                }
            }

            summary.removed = usize::try_from(storage.count_students()?).unwrap_or_default();
            summary.inserted = storage.replace_students(forms)?.len();
        }
        ImportPolicy::Merge => {
            for form in forms {
                if storage.find_student_by_key(form)?.is_some() {
                    summary.unchanged += 1;
                } else if let Some(holder) =
                    storage.find_student(form.class, form.section, form.roll)?
                {
                    warn!(
                        "Skipping {}: roll {} in class {}{} belongs to {}",
                        form.name, form.roll, form.class, form.section, holder.name
                    );
                    summary.conflicts += 1;
                } else {
                    storage.insert_student(form)?;
                    summary.inserted += 1;
                }
            }
        }
    }

    info!(
        "Roster import ({}): {} rows, {} removed, {} inserted, {} unchanged, {} conflicts",
        policy,
        summary.rows,
        summary.removed,
        summary.inserted,
        summary.unchanged,
        summary.conflicts
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Exam, Mark, Scores};
    use crate::registry;

    fn form(name: &str, roll: u32, class: ClassLevel, section: Section) -> NewStudent {
        NewStudent::new(name, roll, class, section).unwrap()
    }

    #[test]
    fn test_parse_valid_rows() {
        let json = br#"[
            {"name": "Ayesha", "roll": 5, "class": 9, "section": "A", "group": "Science"},
            {"name": "Rahim", "roll": 2, "class": 6, "section": "B"}
        ]"#;
        let forms = parse(json).unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0], form("Ayesha", 5, ClassLevel::Nine, Section::A));
    }

    #[test]
    fn test_parse_collapses_duplicates() {
        let json = br#"[
            {"name": "Ayesha", "roll": 5, "class": 9, "section": "A"},
            {"name": "Ayesha", "roll": 5, "class": 9, "section": "A"}
        ]"#;
        assert_eq!(parse(json).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let cases: [&[u8]; 6] = [
            b"not json",
            br#"{"name": "Ayesha"}"#,
            br#"[{"name": "Ayesha", "roll": 5, "class": 11, "section": "A"}]"#,
            br#"[{"name": "Ayesha", "roll": 5, "class": 9, "section": "C"}]"#,
            br#"[{"name": "  ", "roll": 5, "class": 9, "section": "A"}]"#,
            br#"[{"name": "Ayesha", "roll": 0, "class": 9, "section": "A"}]"#,
        ];
        for bad in cases {
            let err = parse(bad).unwrap_err();
            assert!(matches!(err, Error::ImportFormat { .. }), "{err}");
        }
    }

    #[test]
    fn test_export_includes_group_from_marks() {
        let storage = Storage::open_in_memory().unwrap();
        let ayesha =
            registry::register(&storage, &form("Ayesha", 5, ClassLevel::Nine, Section::A)).unwrap();
        registry::register(&storage, &form("Rahim", 1, ClassLevel::Six, Section::A)).unwrap();
        storage
            .upsert_mark(&Mark::graded(
                &ayesha,
                "Physics",
                Exam::Yearly,
                Some(Group::Science),
                Scores::new(45, 20, 20),
            ))
            .unwrap();

        let rows = export(&storage).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Rahim");
        assert_eq!(rows[0].group, None);
        assert_eq!(rows[1].group, Some(Group::Science));
    }

    #[test]
    fn test_replace_swaps_students_and_keeps_marks() {
        let storage = Storage::open_in_memory().unwrap();
        let old =
            registry::register(&storage, &form("Old", 1, ClassLevel::Six, Section::A)).unwrap();
        storage
            .upsert_mark(&Mark::graded(
                &old,
                "Mathematics",
                Exam::Yearly,
                None,
                Scores::new(60, 20, 0),
            ))
            .unwrap();

        let forms = vec![
            form("New", 1, ClassLevel::Six, Section::A),
            form("Other", 2, ClassLevel::Six, Section::A),
        ];
        let summary = import(&storage, &forms, ImportPolicy::Replace).unwrap();

        assert_eq!(summary.removed, 1);
        assert_eq!(summary.inserted, 2);
        assert_eq!(storage.count_students().unwrap(), 2);
        assert_eq!(storage.count_marks().unwrap(), 1);
        let new = storage
            .find_student(ClassLevel::Six, Section::A, 1)
            .unwrap()
            .unwrap();
        assert_ne!(new.id, old.id);
    }

    #[test]
    fn test_replace_rejects_shared_roll_without_writing() {
        let storage = Storage::open_in_memory().unwrap();
        registry::register(&storage, &form("Keep", 1, ClassLevel::Six, Section::A)).unwrap();

        let forms = vec![
            form("A", 3, ClassLevel::Seven, Section::B),
            form("B", 3, ClassLevel::Seven, Section::B),
        ];
        let err = import(&storage, &forms, ImportPolicy::Replace).unwrap_err();
        assert!(matches!(err, Error::ImportFormat { .. }));
        assert_eq!(storage.count_students().unwrap(), 1);
    }

    #[test]
    fn test_merge_skips_existing_and_counts_conflicts() {
        let storage = Storage::open_in_memory().unwrap();
        registry::register(&storage, &form("Ayesha", 5, ClassLevel::Nine, Section::A)).unwrap();

        let forms = vec![
            form("Ayesha", 5, ClassLevel::Nine, Section::A),
            form("Impostor", 5, ClassLevel::Nine, Section::A),
            form("Rahim", 6, ClassLevel::Nine, Section::A),
        ];
        let summary = import(&storage, &forms, ImportPolicy::Merge).unwrap();

        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.removed, 0);
        assert_eq!(storage.count_students().unwrap(), 2);
    }

    #[test]
    fn test_file_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        registry::register(&storage, &form("Ayesha", 5, ClassLevel::Nine, Section::A)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        write_file(&path, &export(&storage).unwrap()).unwrap();

        let forms = read_file(&path).unwrap();
        assert_eq!(forms, vec![form("Ayesha", 5, ClassLevel::Nine, Section::A)]);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_file(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
