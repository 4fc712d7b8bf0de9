//! Storage layer for gradebook.
//!
//! This module provides `SQLite`-based persistent storage for students and
//! their marks. A [`Storage`] value is the only handle to the database; it is
//! opened explicitly, passed to whatever needs it, and closed explicitly.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ClassLevel, Exam, Group, Mark, NewStudent, Section, Student};

const SELECT_STUDENT: &str = "SELECT id, name, roll, class, section, created_at FROM students";

const SELECT_MARK: &str = r"
SELECT id, student_id, subject, exam, class, section, group_name,
       theory, mcq, practical, total, grade, grade_point
FROM marks";

/// Optional class and section restriction for student listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentFilter {
    /// Only students in this class.
    pub class: Option<ClassLevel>,
    /// Only students in this section.
    pub section: Option<Section>,
}

/// Storage engine for students and marks.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Close the database, flushing any pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close the connection.
    pub fn close(self) -> Result<()> {
        debug!("Closing database at {}", self.path.display());
        self.conn.close().map_err(|(_, err)| err.into())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Students ===

    /// Insert a student without any uniqueness check.
    ///
    /// Callers that need the roll to be unique go through
    /// [`crate::registry::register`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_student(&self, student: &NewStudent) -> Result<Student> {
        insert_student_with(&self.conn, student)
    }

    /// Get a student by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_student(&self, id: i64) -> Result<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!("{SELECT_STUDENT} WHERE id = ?1"),
                [id],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// Find the student holding a roll number in a class and section.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_student(
        &self,
        class: ClassLevel,
        section: Section,
        roll: u32,
    ) -> Result<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!(
                    "{SELECT_STUDENT} WHERE class = ?1 AND section = ?2 AND roll = ?3 \
                     ORDER BY id LIMIT 1"
                ),
                params![u8::from(class), section.as_str(), roll],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// Find a student by name, roll, class and section.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_student_by_key(&self, student: &NewStudent) -> Result<Option<Student>> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "{SELECT_STUDENT} WHERE name = ?1 AND roll = ?2 AND class = ?3 AND section = ?4 \
                     ORDER BY id LIMIT 1"
                ),
                params![
                    student.name,
                    student.roll,
                    u8::from(student.class),
                    student.section.as_str()
                ],
                Self::row_to_student,
            )
            .optional()?;
        Ok(found)
    }

    /// All students in a class and section, ordered by roll.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn students_in_section(&self, class: ClassLevel, section: Section) -> Result<Vec<Student>> {
        self.list_students(StudentFilter {
            class: Some(class),
            section: Some(section),
        })
    }

    /// List students ordered by class, section and roll.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_students(&self, filter: StudentFilter) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_STUDENT} WHERE (?1 IS NULL OR class = ?1) AND (?2 IS NULL OR section = ?2) \
             ORDER BY class, section, roll, id"
        ))?;

        let students = stmt
            .query_map(
                params![
                    filter.class.map(u8::from),
                    filter.section.map(Section::as_str)
                ],
                Self::row_to_student,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(students)
    }

    /// Delete a student and every mark recorded for them.
    ///
    /// Returns `true` if a student was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_student(&self, id: i64) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let marks = tx.execute("DELETE FROM marks WHERE student_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM students WHERE id = ?1", [id])?;
        tx.commit()?;

        if affected > 0 {
            info!("Deleted student {} and {} marks", id, marks);
        }
        Ok(affected > 0)
    }

    /// Delete every student. Marks are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_students(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM students", [])?;
        info!("Cleared {} students", affected);
        Ok(affected)
    }

    /// Atomically swap the whole student list for `students`.
    ///
    /// Marks are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing changes in that case.
    pub fn replace_students(&self, students: &[NewStudent]) -> Result<Vec<Student>> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM students", [])?;
        let inserted = students
            .iter()
            .map(|s| insert_student_with(&tx, s))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        info!(
            "Replaced {} students with {} new records",
            removed,
            inserted.len()
        );
        Ok(inserted)
    }

    /// Count registered students.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_students(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of students per class, lowest class first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_by_class(&self) -> Result<Vec<(ClassLevel, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT class, COUNT(*) FROM students GROUP BY class ORDER BY class")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(class, count)| match ClassLevel::try_from(class) {
                Ok(class) => Some((class, count)),
                Err(_) => {
                    warn!("Ignoring {} students stored with unknown class {}", count, class);
                    None
                }
            })
            .collect())
    }

    // === Marks ===

    /// Insert a mark, or replace the existing one for the same student,
    /// subject and exam, in a single statement.
    ///
    /// Returns the ID of the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_mark(&self, mark: &Mark) -> Result<i64> {
        let id: i64 = self.conn.query_row(
            r"
            INSERT INTO marks (student_id, subject, exam, class, section, group_name,
                               theory, mcq, practical, total, grade, grade_point)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (student_id, subject, exam) DO UPDATE SET
                class = excluded.class,
                section = excluded.section,
                group_name = excluded.group_name,
                theory = excluded.theory,
                mcq = excluded.mcq,
                practical = excluded.practical,
                total = excluded.total,
                grade = excluded.grade,
                grade_point = excluded.grade_point,
                updated_at = datetime('now')
            RETURNING id
            ",
            params![
                mark.student_id,
                mark.subject,
                mark.exam.as_str(),
                u8::from(mark.class),
                mark.section.as_str(),
                mark.group.map(Group::as_str),
                mark.theory,
                mark.mcq,
                mark.practical,
                mark.total,
                mark.grade.letter(),
                mark.grade_point,
            ],
            |row| row.get(0),
        )?;

        debug!(
            "Stored mark {} for student {} ({} / {})",
            id, mark.student_id, mark.subject, mark.exam
        );
        Ok(id)
    }

    /// Every stored mark for a student in an exam, in entry order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn marks_for(&self, student_id: i64, exam: Exam) -> Result<Vec<Mark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_MARK} WHERE student_id = ?1 AND exam = ?2 ORDER BY id"))?;

        let marks = stmt
            .query_map(params![student_id, exam.as_str()], Self::row_to_mark)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(marks)
    }

    /// The mark for one student, subject and exam.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_mark(&self, student_id: i64, subject: &str, exam: Exam) -> Result<Option<Mark>> {
        let mark = self
            .conn
            .query_row(
                &format!("{SELECT_MARK} WHERE student_id = ?1 AND subject = ?2 AND exam = ?3"),
                params![student_id, subject, exam.as_str()],
                Self::row_to_mark,
            )
            .optional()?;
        Ok(mark)
    }

    /// Count stored marks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_marks(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM marks", [], |row| row.get(0))?;
        Ok(count)
    }

    /// The group recorded on the student's earliest grouped mark, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn student_group(&self, student_id: i64) -> Result<Option<Group>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT group_name FROM marks WHERE student_id = ?1 AND group_name IS NOT NULL \
                 ORDER BY id LIMIT 1",
                [student_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.and_then(|n| parse_group(&n)))
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_students = self.count_students()?;
        let total_marks = self.count_marks()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_students,
            total_marks,
            db_size_bytes,
        })
    }

    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let roll: u32 = row.get(2)?;
        let class: u8 = row.get(3)?;
        let section: String = row.get(4)?;
        let created_at: String = row.get(5)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(Student {
            id,
            name,
            roll,
            class: class_column(3, class)?,
            section: parse_column(4, &section)?,
            created_at,
        })
    }

    fn row_to_mark(row: &rusqlite::Row) -> rusqlite::Result<Mark> {
        let exam: String = row.get(3)?;
        let class: u8 = row.get(4)?;
        let section: String = row.get(5)?;
        let group: Option<String> = row.get(6)?;
        let grade: String = row.get(11)?;

        Ok(Mark {
            id: Some(row.get(0)?),
            student_id: row.get(1)?,
            subject: row.get(2)?,
            exam: parse_column(3, &exam)?,
            class: class_column(4, class)?,
            section: parse_column(5, &section)?,
            group: group.as_deref().and_then(parse_group),
            theory: row.get(7)?,
            mcq: row.get(8)?,
            practical: row.get(9)?,
            total: row.get(10)?,
            grade: parse_column(11, &grade)?,
            grade_point: row.get(12)?,
        })
    }
}

fn insert_student_with(conn: &Connection, student: &NewStudent) -> Result<Student> {
    let created_at = Utc::now();
    conn.execute(
        r"
        INSERT INTO students (name, roll, class, section, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
        params![
            student.name,
            student.roll,
            u8::from(student.class),
            student.section.as_str(),
            created_at.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!(
        "Inserted student {} (roll {}, class {}{})",
        id, student.roll, student.class, student.section
    );

    Ok(Student {
        id,
        name: student.name.clone(),
        roll: student.roll,
        class: student.class,
        section: student.section,
        created_at,
    })
}

fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    value
        .parse()
        .map_err(|err: Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn class_column(idx: usize, value: u8) -> rusqlite::Result<ClassLevel> {
    ClassLevel::try_from(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn parse_group(name: &str) -> Option<Group> {
    match name.parse() {
        Ok(group) => Some(group),
        Err(_) => {
            warn!("Unknown group: {}, treating as ungrouped", name);
            None
        }
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of registered students.
    pub total_students: i64,
    /// Total number of stored marks.
    pub total_marks: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;
    use crate::model::Scores;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn new_student(name: &str, roll: u32, class: ClassLevel, section: Section) -> NewStudent {
        NewStudent::new(name, roll, class, section).unwrap()
    }

    fn physics(student: &Student, scores: Scores) -> Mark {
        Mark::graded(student, "Physics", Exam::Yearly, Some(Group::Science), scores)
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get_student() {
        let storage = create_test_storage();
        let created = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();

        let fetched = storage.get_student(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Ayesha");
        assert_eq!(fetched.roll, 5);
        assert_eq!(fetched.class, ClassLevel::Nine);
        assert_eq!(fetched.section, Section::A);
    }

    #[test]
    fn test_get_nonexistent_student() {
        let storage = create_test_storage();
        assert!(storage.get_student(99999).unwrap().is_none());
    }

    #[test]
    fn test_find_student_by_slot() {
        let storage = create_test_storage();
        storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();

        assert!(storage
            .find_student(ClassLevel::Nine, Section::A, 5)
            .unwrap()
            .is_some());
        assert!(storage
            .find_student(ClassLevel::Nine, Section::B, 5)
            .unwrap()
            .is_none());
        assert!(storage
            .find_student(ClassLevel::Ten, Section::A, 5)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_student_by_key_requires_name_match() {
        let storage = create_test_storage();
        let key = new_student("Ayesha", 5, ClassLevel::Nine, Section::A);
        storage.insert_student(&key).unwrap();

        assert!(storage.find_student_by_key(&key).unwrap().is_some());
        let other = new_student("Rahim", 5, ClassLevel::Nine, Section::A);
        assert!(storage.find_student_by_key(&other).unwrap().is_none());
    }

    #[test]
    fn test_students_in_section_sorted_by_roll() {
        let storage = create_test_storage();
        for (name, roll) in [("C", 3), ("A", 1), ("B", 2)] {
            storage
                .insert_student(&new_student(name, roll, ClassLevel::Seven, Section::B))
                .unwrap();
        }
        storage
            .insert_student(&new_student("Other", 4, ClassLevel::Seven, Section::A))
            .unwrap();

        let rolls: Vec<u32> = storage
            .students_in_section(ClassLevel::Seven, Section::B)
            .unwrap()
            .iter()
            .map(|s| s.roll)
            .collect();
        assert_eq!(rolls, vec![1, 2, 3]);
    }

    #[test]
    fn test_list_students_filters() {
        let storage = create_test_storage();
        storage
            .insert_student(&new_student("A", 1, ClassLevel::Ten, Section::A))
            .unwrap();
        storage
            .insert_student(&new_student("B", 1, ClassLevel::Six, Section::B))
            .unwrap();
        storage
            .insert_student(&new_student("C", 2, ClassLevel::Six, Section::A))
            .unwrap();

        let all = storage.list_students(StudentFilter::default()).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        let six = storage
            .list_students(StudentFilter {
                class: Some(ClassLevel::Six),
                section: None,
            })
            .unwrap();
        assert_eq!(six.len(), 2);

        let section_b = storage
            .list_students(StudentFilter {
                class: None,
                section: Some(Section::B),
            })
            .unwrap();
        assert_eq!(section_b.len(), 1);
        assert_eq!(section_b[0].name, "B");
    }

    #[test]
    fn test_delete_student_removes_marks() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();

        assert!(storage.delete_student(student.id).unwrap());
        assert!(storage.get_student(student.id).unwrap().is_none());
        assert_eq!(storage.count_marks().unwrap(), 0);
    }

    #[test]
    fn test_delete_nonexistent_student() {
        let storage = create_test_storage();
        assert!(!storage.delete_student(99999).unwrap());
    }

    #[test]
    fn test_clear_students_keeps_marks() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();

        assert_eq!(storage.clear_students().unwrap(), 1);
        assert_eq!(storage.count_students().unwrap(), 0);
        assert_eq!(storage.count_marks().unwrap(), 1);
    }

    #[test]
    fn test_replace_students() {
        let storage = create_test_storage();
        storage
            .insert_student(&new_student("Old", 1, ClassLevel::Six, Section::A))
            .unwrap();

        let inserted = storage
            .replace_students(&[
                new_student("New A", 1, ClassLevel::Seven, Section::A),
                new_student("New B", 2, ClassLevel::Seven, Section::A),
            ])
            .unwrap();

        assert_eq!(inserted.len(), 2);
        assert_eq!(storage.count_students().unwrap(), 2);
        assert!(storage
            .find_student(ClassLevel::Six, Section::A, 1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ids_are_not_reused_after_clear() {
        let storage = create_test_storage();
        let first = storage
            .insert_student(&new_student("A", 1, ClassLevel::Six, Section::A))
            .unwrap();
        storage.clear_students().unwrap();
        let second = storage
            .insert_student(&new_student("A", 1, ClassLevel::Six, Section::A))
            .unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_count_by_class() {
        let storage = create_test_storage();
        storage
            .insert_student(&new_student("A", 1, ClassLevel::Nine, Section::A))
            .unwrap();
        storage
            .insert_student(&new_student("B", 2, ClassLevel::Nine, Section::B))
            .unwrap();
        storage
            .insert_student(&new_student("C", 1, ClassLevel::Six, Section::A))
            .unwrap();

        assert_eq!(
            storage.count_by_class().unwrap(),
            vec![(ClassLevel::Six, 1), (ClassLevel::Nine, 2)]
        );
    }

    #[test]
    fn test_upsert_mark_inserts_then_overwrites() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();

        let first = storage
            .upsert_mark(&physics(&student, Scores::new(20, 5, 5)))
            .unwrap();
        let second = storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.count_marks().unwrap(), 1);

        let stored = storage
            .get_mark(student.id, "Physics", Exam::Yearly)
            .unwrap()
            .unwrap();
        assert_eq!(stored.total, 85);
        assert_eq!(stored.grade, Grade::APlus);
        assert_eq!(stored.group, Some(Group::Science));
    }

    #[test]
    fn test_same_subject_in_other_exam_is_separate() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        let mut mark = physics(&student, Scores::new(40, 20, 20));
        storage.upsert_mark(&mark).unwrap();
        mark.exam = Exam::HalfYearly;
        storage.upsert_mark(&mark).unwrap();

        assert_eq!(storage.count_marks().unwrap(), 2);
        assert_eq!(storage.marks_for(student.id, Exam::Yearly).unwrap().len(), 1);
        assert_eq!(
            storage.marks_for(student.id, Exam::HalfYearly).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_marks_for_round_trips_fields() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Karim", 2, ClassLevel::Seven, Section::B))
            .unwrap();
        let mark = Mark::graded(
            &student,
            "Mathematics",
            Exam::HalfYearly,
            None,
            Scores::new(50, 15, 0),
        );
        let id = storage.upsert_mark(&mark).unwrap();

        let marks = storage.marks_for(student.id, Exam::HalfYearly).unwrap();
        assert_eq!(marks.len(), 1);
        let stored = &marks[0];
        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.group, None);
        assert_eq!(stored.scores(), Scores::new(50, 15, 0));
        assert_eq!(stored.grade, Grade::AMinus);
        assert_eq!(stored.class, ClassLevel::Seven);
        assert_eq!(stored.section, Section::B);
    }

    #[test]
    fn test_student_group() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        assert_eq!(storage.student_group(student.id).unwrap(), None);

        storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();
        assert_eq!(
            storage.student_group(student.id).unwrap(),
            Some(Group::Science)
        );
    }

    #[test]
    fn test_unknown_stored_group_is_ignored() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();
        storage
            .conn
            .execute("UPDATE marks SET group_name = 'Fine Arts'", [])
            .unwrap();

        let marks = storage.marks_for(student.id, Exam::Yearly).unwrap();
        assert_eq!(marks[0].group, None);
    }

    #[test]
    fn test_corrupt_class_is_a_query_error() {
        let storage = create_test_storage();
        let student = storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        storage
            .upsert_mark(&physics(&student, Scores::new(45, 20, 20)))
            .unwrap();
        storage
            .conn
            .execute("UPDATE marks SET class = 42", [])
            .unwrap();

        let err = storage.marks_for(student.id, Exam::Yearly).unwrap_err();
        assert!(matches!(err, Error::DatabaseQuery(_)));
        assert!(err.is_persistence());
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.total_marks, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_close() {
        let storage = create_test_storage();
        assert!(storage.close().is_ok());
    }

    #[test]
    fn test_open_file_based_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("school.db");

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert_student(&new_student("Ayesha", 5, ClassLevel::Nine, Section::A))
            .unwrap();
        assert_eq!(storage.path(), db_path);
        storage.close().unwrap();

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.count_students().unwrap(), 1);
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/school.db");

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());
        drop(storage);
    }
}
