//! Transcript rendering: fixed-width text pages and JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SchoolConfig;
use crate::error::Result;
use crate::grading::{marking_scheme_of, Grade, GRADING_SCALE};
use crate::marksheet::{Marksheet, ResultStatus};

/// Page width in columns.
const WIDTH: usize = 78;

/// Separates pages of a section document.
pub const PAGE_BREAK: char = '\u{000C}';

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A printable transcript page.
#[derive(Debug, Clone, Copy)]
pub struct Transcript<'a> {
    sheet: &'a Marksheet,
    school: &'a SchoolConfig,
    year: i32,
}

impl<'a> Transcript<'a> {
    /// A transcript for `sheet` under the school's letterhead.
    #[must_use]
    pub fn new(sheet: &'a Marksheet, school: &'a SchoolConfig, year: i32) -> Self {
        Self {
            sheet,
            school,
            year,
        }
    }

    fn header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:^WIDTH$}", self.school.name.to_uppercase())?;
        writeln!(f, "{:^WIDTH$}", self.school.address)?;
        writeln!(f)?;
        let title = format!(
            "{} EXAMINATION - {}",
            self.sheet.exam.as_str().to_uppercase(),
            self.year
        );
        writeln!(f, "{title:^WIDTH$}")?;
        writeln!(f, "{:^WIDTH$}", "ACADEMIC TRANSCRIPT")?;
        rule(f, '=')
    }

    fn student(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.sheet.student;
        writeln!(
            f,
            "{:<16}{:<30}{:<16}Class {}",
            "Student Name:", s.name, "Class:", s.class
        )?;
        writeln!(
            f,
            "{:<16}{:<30}{:<16}{}",
            "Roll Number:", s.roll, "Section:", s.section
        )?;
        if let Some(group) = self.sheet.group {
            writeln!(f, "{:<16}{}", "Group:", group)?;
        }
        rule(f, '-')
    }

    fn subjects(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:^WIDTH$}", "SUBJECT WISE MARKS & GRADES")?;
        writeln!(
            f,
            "{:<30}{:>8}{:>6}{:>10}{:>7}{:>7}{:>7}",
            "Subject Name", "Written", "MCQ", "Practical", "Total", "Grade", "GPA"
        )?;
        rule(f, '-')?;

        if self.sheet.marks.is_empty() {
            writeln!(f, "{:^WIDTH$}", "No marks entered yet")?;
        }
        for mark in &self.sheet.marks {
            let scheme = marking_scheme_of(&mark.subject);
            writeln!(
                f,
                "{:<30}{:>8}{:>6}{:>10}{:>7}{:>7}{:>7.1}",
                mark.subject,
                component(scheme.written, mark.theory),
                component(scheme.mcq, mark.mcq),
                component(scheme.practical, mark.practical),
                mark.total,
                mark.grade.letter(),
                mark.grade_point
            )?;
        }
        rule(f, '-')
    }

    fn summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sheet = self.sheet;
        writeln!(f, "ACADEMIC SUMMARY")?;
        writeln!(f, "  {:<22}{}", "Total Subjects:", sheet.subjects)?;
        writeln!(
            f,
            "  {:<22}{:.1}",
            "Total Grade Points:", sheet.total_grade_points
        )?;
        writeln!(
            f,
            "  {:<22}{} / {}",
            "Total Marks:",
            sheet.total_obtained(),
            sheet.total_possible()
        )?;
        writeln!(f, "  {:<22}{:.2}", "Overall GPA:", sheet.reported_gpa())?;
        writeln!(f)?;

        writeln!(f, "FINAL RESULT")?;
        writeln!(f, "  {:<22}{}", "Letter Grade:", sheet.overall_grade())?;
        writeln!(f, "  {:<22}{}", "Status:", sheet.status())?;
        if let (Some(rank), Some(of)) = (sheet.section_rank, sheet.total_students_in_section) {
            writeln!(f, "  {:<22}{} of {}", "Section Rank:", rank, of)?;
        }
        rule(f, '-')
    }

    fn scale(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:^WIDTH$}", "GRADING SCALE")?;
        let cells: Vec<String> = GRADING_SCALE
            .iter()
            .map(|(band, grade)| format!("{} {} {:.2}", grade.letter(), band, grade.grade_point()))
            .collect();
        for line in cells.chunks(4) {
            writeln!(f, "  {}", line.join("   "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Transcript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.header(f)?;
        self.student(f)?;
        self.subjects(f)?;
        self.summary(f)?;
        Self::scale(f)
    }
}

fn rule(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(WIDTH))
}

/// A score cell; `-` for a component the subject does not have.
fn component(max: u32, score: u32) -> String {
    if max > 0 {
        score.to_string()
    } else {
        "-".to_string()
    }
}

/// Render one transcript page.
#[must_use]
pub fn transcript(sheet: &Marksheet, school: &SchoolConfig, year: i32) -> String {
    Transcript::new(sheet, school, year).to_string()
}

/// Render a section as one document, one page per student.
#[must_use]
pub fn section(sheets: &[Marksheet], school: &SchoolConfig, year: i32) -> String {
    sheets
        .iter()
        .map(|sheet| transcript(sheet, school, year))
        .collect::<Vec<_>>()
        .join(&PAGE_BREAK.to_string())
}

/// A marksheet together with its derived result fields.
#[derive(Debug, Clone, Serialize)]
pub struct MarksheetReport<'a> {
    /// The assembled marksheet.
    #[serde(flatten)]
    pub marksheet: &'a Marksheet,
    /// Pass or fail.
    pub status: ResultStatus,
    /// GPA as printed.
    pub reported_gpa: f64,
    /// Overall letter grade.
    pub overall_grade: Grade,
    /// Sum of subject totals.
    pub total_obtained: u32,
    /// Sum of subject full marks.
    pub total_possible: u32,
}

impl<'a> From<&'a Marksheet> for MarksheetReport<'a> {
    fn from(sheet: &'a Marksheet) -> Self {
        Self {
            marksheet: sheet,
            status: sheet.status(),
            reported_gpa: sheet.reported_gpa(),
            overall_grade: sheet.overall_grade(),
            total_obtained: sheet.total_obtained(),
            total_possible: sheet.total_possible(),
        }
    }
}

/// Pretty JSON for one marksheet, derived fields included.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn transcript_json(sheet: &Marksheet) -> Result<String> {
    Ok(serde_json::to_string_pretty(&MarksheetReport::from(sheet))?)
}

/// Pretty JSON array of marksheets, derived fields included.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn section_json(sheets: &[Marksheet]) -> Result<String> {
    let reports: Vec<MarksheetReport<'_>> = sheets.iter().map(MarksheetReport::from).collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}
