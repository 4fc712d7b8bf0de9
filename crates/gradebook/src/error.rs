//! Error types for gradebook.
//!
//! Every fallible operation in the crate returns [`Error`]. The variants fall
//! into the families reported by [`Error::kind`]: validation problems are
//! caught before anything is written, not-found errors let the caller retry
//! with different input, and persistence errors come from the store itself.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{ClassLevel, Section};

/// The main error type for gradebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required field was missing or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field value is outside its allowed set.
    #[error("invalid {field}: {value}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// The rejected value as entered.
        value: String,
    },

    /// Another student already holds this roll number in the class and section.
    #[error("a student with roll {roll} already exists in class {class} section {section}")]
    DuplicateRoll {
        /// The contested roll number.
        roll: u32,
        /// Class of the existing student.
        class: ClassLevel,
        /// Section of the existing student.
        section: Section,
    },

    /// One or more entered component scores exceed the subject's maximum.
    #[error("validation errors:\n{}", .violations.join("\n"))]
    ScoresOutOfRange {
        /// One human-readable line per offending component.
        violations: Vec<String>,
    },

    /// The subject is not taught to the given class and group.
    #[error("subject '{subject}' is not part of the curriculum for class {class}")]
    SubjectNotInCatalog {
        /// The rejected subject name.
        subject: String,
        /// The class the entry was made for.
        class: ClassLevel,
    },

    /// Classes 9 and 10 need a group before subjects can be resolved.
    #[error("class {class} requires a group")]
    GroupRequired {
        /// The class missing its group.
        class: ClassLevel,
    },

    // === Not Found Errors ===
    /// No student holds the given roll in the class and section.
    #[error("student not found: roll {roll} in class {class} section {section}")]
    StudentNotFound {
        /// Roll that was looked up.
        roll: u32,
        /// Class that was searched.
        class: ClassLevel,
        /// Section that was searched.
        section: Section,
    },

    /// A record looked up by identifier does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Import Errors ===
    /// A roster file could not be understood; nothing was written.
    #[error("malformed roster: {message}")]
    ImportFormat {
        /// Description of the first problem found.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for gradebook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad family an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the operation was aborted before writing.
    Validation,
    /// The queried record does not exist.
    NotFound,
    /// The underlying store or file system failed.
    Persistence,
    /// A roster file was malformed.
    ImportFormat,
    /// Configuration could not be loaded or is invalid.
    Config,
    /// Anything else.
    Internal,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid value error.
    #[must_use]
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }

    /// Create an import format error.
    #[must_use]
    pub fn import_format(message: impl Into<String>) -> Self {
        Self::ImportFormat {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::InvalidValue { .. }
            | Self::DuplicateRoll { .. }
            | Self::ScoresOutOfRange { .. }
            | Self::SubjectNotInCatalog { .. }
            | Self::GroupRequired { .. } => ErrorKind::Validation,
            Self::StudentNotFound { .. } | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::Io(_)
            | Self::DirectoryCreate { .. } => ErrorKind::Persistence,
            Self::ImportFormat { .. } => ErrorKind::ImportFormat,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Config,
            Self::Json(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error was raised by input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error means a record was absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error came from the store or file system.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_roll_display() {
        let err = Error::DuplicateRoll {
            roll: 5,
            class: ClassLevel::Nine,
            section: Section::A,
        };
        assert_eq!(
            err.to_string(),
            "a student with roll 5 already exists in class 9 section A"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_scores_out_of_range_lists_every_violation() {
        let err = Error::ScoresOutOfRange {
            violations: vec![
                "Rahim: Written marks (80) exceed maximum (70)".to_string(),
                "Karim: MCQ marks (31) exceed maximum (30)".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("validation errors:"));
        assert!(msg.contains("Rahim"));
        assert!(msg.contains("Karim"));
    }

    #[test]
    fn test_student_not_found_is_not_found() {
        let err = Error::StudentNotFound {
            roll: 12,
            class: ClassLevel::Six,
            section: Section::B,
        };
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("roll 12"));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            entity: "student",
            id: 42,
        };
        assert_eq!(err.to_string(), "student not found: 42");
    }

    #[test]
    fn test_invalid_value() {
        let err = Error::invalid("class", "11");
        assert_eq!(err.to_string(), "invalid class: 11");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_import_format() {
        let err = Error::import_format("expected an array of rows");
        assert_eq!(err.kind(), ErrorKind::ImportFormat);
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_group_required_display() {
        let err = Error::GroupRequired {
            class: ClassLevel::Ten,
        };
        assert_eq!(err.to_string(), "class 10 requires a group");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(err.is_persistence());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_persistence());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "school name is empty".to_string(),
        };
        assert!(err.to_string().contains("school name is empty"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
        assert!(err.is_persistence());
    }
}
