//! `gradebook` - Student records and grading for a single school
//!
//! This library registers students, records per-subject marks, derives grades
//! and GPA, ranks students within their section, and renders transcripts. All
//! state lives in one embedded `SQLite` file.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod grading;
pub mod logging;
pub mod marksheet;
pub mod model;
pub mod registry;
pub mod render;
pub mod roster;
pub mod storage;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use grading::{grade_of, marking_scheme_of, Grade, MarkingScheme};
pub use logging::init_logging;
pub use marksheet::{Marksheet, ResultStatus};
pub use model::{ClassLevel, Exam, Group, Mark, NewStudent, Scores, Section, Student};
pub use storage::{Storage, StorageStats, StudentFilter};
