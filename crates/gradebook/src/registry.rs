//! Student registration, listing and removal.

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{ClassLevel, NewStudent, Student};
use crate::storage::{Storage, StudentFilter};

/// Register a new student.
///
/// The roll number must be free within the student's class and section; the
/// lookup happens before anything is written.
///
/// # Errors
///
/// Returns [`Error::DuplicateRoll`] when the slot is taken, or a storage error.
pub fn register(storage: &Storage, form: &NewStudent) -> Result<Student> {
    if storage
        .find_student(form.class, form.section, form.roll)?
        .is_some()
    {
        return Err(Error::DuplicateRoll {
            roll: form.roll,
            class: form.class,
            section: form.section,
        });
    }

    let student = storage.insert_student(form)?;
    info!(
        "Registered student {} ({}, roll {}, class {}{})",
        student.id, student.name, student.roll, student.class, student.section
    );
    Ok(student)
}

/// List students, ordered by class, section and roll.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list(storage: &Storage, filter: StudentFilter) -> Result<Vec<Student>> {
    storage.list_students(filter)
}

/// Delete a student and their marks.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no student has this ID.
pub fn delete(storage: &Storage, id: i64) -> Result<()> {
    if storage.delete_student(id)? {
        Ok(())
    } else {
        Err(Error::NotFound {
            entity: "student",
            id,
        })
    }
}

/// Headline numbers for the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Registered students.
    pub total_students: i64,
    /// Students per class, lowest class first; classes with nobody are omitted.
    pub students_by_class: Vec<(ClassLevel, i64)>,
    /// Stored marks across every exam.
    pub total_marks: i64,
}

/// Collect the home screen numbers.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn dashboard(storage: &Storage) -> Result<Dashboard> {
    Ok(Dashboard {
        total_students: storage.count_students()?,
        students_by_class: storage.count_by_class()?,
        total_marks: storage.count_marks()?,
    })
}
