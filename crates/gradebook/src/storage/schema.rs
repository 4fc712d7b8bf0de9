//! `SQLite` schema definitions for gradebook.
//!
//! Uniqueness of a roll within a class and section is checked by the
//! registry before insert, so the slot index is not `UNIQUE`. Marks are
//! unique per student, subject and exam, which is what the upsert keys on.

/// SQL statement to create the students table.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    roll INTEGER NOT NULL,
    class INTEGER NOT NULL,
    section TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Index for roll lookups and section listings.
pub const CREATE_STUDENT_SLOT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_slot ON students(class, section, roll)
";

/// SQL statement to create the marks table.
pub const CREATE_MARKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS marks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL,
    subject TEXT NOT NULL,
    exam TEXT NOT NULL,
    class INTEGER NOT NULL,
    section TEXT NOT NULL,
    group_name TEXT,
    theory INTEGER NOT NULL DEFAULT 0,
    mcq INTEGER NOT NULL DEFAULT 0,
    practical INTEGER NOT NULL DEFAULT 0,
    total INTEGER NOT NULL,
    grade TEXT NOT NULL,
    grade_point REAL NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (student_id, subject, exam)
)
";

/// Index for loading one student's marks for an exam.
pub const CREATE_MARKS_STUDENT_EXAM_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_marks_student_exam ON marks(student_id, exam)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STUDENTS_TABLE,
    CREATE_STUDENT_SLOT_INDEX,
    CREATE_MARKS_TABLE,
    CREATE_MARKS_STUDENT_EXAM_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_students_table_columns() {
        assert!(CREATE_STUDENTS_TABLE.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_STUDENTS_TABLE.contains("roll INTEGER NOT NULL"));
        assert!(CREATE_STUDENTS_TABLE.contains("section TEXT NOT NULL"));
    }

    #[test]
    fn test_marks_table_is_unique_per_triple() {
        assert!(CREATE_MARKS_TABLE.contains("UNIQUE (student_id, subject, exam)"));
        assert!(CREATE_MARKS_TABLE.contains("grade_point REAL NOT NULL"));
    }
}
