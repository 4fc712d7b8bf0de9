//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{Exam, Group, Scores, Section};
use crate::render::OutputFormat;
use crate::roster::ImportPolicy;

/// Student registry commands.
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Register a new student
    Add {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Roll number, unique within the class and section
        #[arg(short, long)]
        roll: u32,

        #[command(flatten)]
        slot: SlotArgs,
    },

    /// List registered students
    List {
        /// Only this class
        #[arg(long, value_parser = clap::value_parser!(u8).range(6..=10))]
        class: Option<u8>,

        /// Only this section
        #[arg(long, value_enum, ignore_case = true)]
        section: Option<SectionArg>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a student and their marks
    Delete {
        /// Student ID (see `student list`)
        id: i64,
    },
}

/// Class and section of a student or batch.
#[derive(Debug, Clone, Args)]
pub struct SlotArgs {
    /// Class (6-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(6..=10))]
    pub class: u8,

    /// Section
    #[arg(long, value_enum, ignore_case = true)]
    pub section: SectionArg,
}

/// What a batch of marks is for.
#[derive(Debug, Clone, Args)]
pub struct EntryArgs {
    /// Examination
    #[arg(short, long, value_enum, ignore_case = true)]
    pub exam: ExamArg,

    #[command(flatten)]
    pub slot: SlotArgs,

    /// Group (required for classes 9 and 10)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub group: Option<GroupArg>,

    /// Subject name as listed by `subjects`
    #[arg(short, long)]
    pub subject: String,
}

/// Mark entry commands.
#[derive(Debug, Subcommand)]
pub enum MarksCommand {
    /// Save scores for one subject
    Enter {
        #[command(flatten)]
        entry: EntryArgs,

        /// Scores as ROLL=WRITTEN[,MCQ[,PRACTICAL]]; repeat per student
        #[arg(long = "score", value_name = "ROLL=W,M,P", value_parser = parse_score, required = true)]
        scores: Vec<ScoreEntry>,
    },

    /// Show the entry sheet for one subject
    Show {
        #[command(flatten)]
        entry: EntryArgs,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Marksheet command arguments.
#[derive(Debug, Args)]
pub struct MarksheetCommand {
    /// Examination
    #[arg(short, long, value_enum, ignore_case = true)]
    pub exam: ExamArg,

    #[command(flatten)]
    pub slot: SlotArgs,

    /// One student's transcript; omit for the whole section
    #[arg(short, long)]
    pub roll: Option<u32>,

    /// Output format (defaults to `output.default_format`)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Subjects command arguments.
#[derive(Debug, Args)]
pub struct SubjectsCommand {
    /// Class (6-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(6..=10))]
    pub class: u8,

    /// Group (classes 9 and 10)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub group: Option<GroupArg>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Roster import and export.
#[derive(Debug, Subcommand)]
pub enum RosterCommand {
    /// Write every student as a JSON roster
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Load students from a JSON roster
    Import {
        /// Roster file
        file: PathBuf,

        /// Replace all students or merge into them
        #[arg(short, long, value_enum, default_value = "merge")]
        policy: ImportPolicyArg,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// One `--score` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Roll number.
    pub roll: u32,
    /// Component scores.
    pub scores: Scores,
}

/// Parse `ROLL=WRITTEN[,MCQ[,PRACTICAL]]`; omitted components are zero.
///
/// # Errors
///
/// Returns a message naming the malformed part.
pub fn parse_score(s: &str) -> Result<ScoreEntry, String> {
    let (roll, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROLL=WRITTEN,MCQ,PRACTICAL, got `{s}`"))?;
    let roll: u32 = roll
        .trim()
        .parse()
        .map_err(|_| format!("invalid roll `{}`", roll.trim()))?;

    let parts = rest
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid score `{}` for roll {roll}", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let scores = match parts[..] {
        [theory] => Scores::new(theory, 0, 0),
        [theory, mcq] => Scores::new(theory, mcq, 0),
        [theory, mcq, practical] => Scores::new(theory, mcq, practical),
        _ => return Err(format!("roll {roll}: expected at most three scores")),
    };
    Ok(ScoreEntry { roll, scores })
}

/// Section argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    /// Section A
    A,
    /// Section B
    B,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::A => Self::A,
            SectionArg::B => Self::B,
        }
    }
}

/// Examination argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExamArg {
    /// Half-Yearly examination
    HalfYearly,
    /// Yearly examination
    Yearly,
}

impl From<ExamArg> for Exam {
    fn from(arg: ExamArg) -> Self {
        match arg {
            ExamArg::HalfYearly => Self::HalfYearly,
            ExamArg::Yearly => Self::Yearly,
        }
    }
}

/// Group argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    /// Science
    Science,
    /// Business Studies
    #[value(name = "business-studies", alias = "business")]
    BusinessStudies,
    /// Humanities
    Humanities,
}

impl From<GroupArg> for Group {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Science => Self::Science,
            GroupArg::BusinessStudies => Self::BusinessStudies,
            GroupArg::Humanities => Self::Humanities,
        }
    }
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Printable text
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Import policy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportPolicyArg {
    /// Remove all students first
    Replace,
    /// Keep existing students
    Merge,
}

impl From<ImportPolicyArg> for ImportPolicy {
    fn from(arg: ImportPolicyArg) -> Self {
        match arg {
            ImportPolicyArg::Replace => Self::Replace,
            ImportPolicyArg::Merge => Self::Merge,
        }
    }
}
