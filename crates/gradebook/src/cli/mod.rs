//! Command-line interface for gradebook.
//!
//! This module provides the CLI structure for the `gradebook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_score, ConfigCommand, EntryArgs, ExamArg, FormatArg, GroupArg, ImportPolicyArg,
    MarksCommand, MarksheetCommand, RosterCommand, ScoreEntry, SectionArg, SlotArgs,
    StatusCommand, StudentCommand, SubjectsCommand,
};

use crate::logging::Verbosity;

/// gradebook - Student records, marks and transcripts for one school
///
/// Register students, enter per-subject marks, and print transcripts with
/// GPA and section rank.
#[derive(Debug, Parser)]
#[command(name = "gradebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register, list and delete students
    #[command(subcommand)]
    Student(StudentCommand),

    /// Enter and review marks
    #[command(subcommand)]
    Marks(MarksCommand),

    /// Print transcripts
    Marksheet(MarksheetCommand),

    /// List the subjects and marking schemes for a class
    Subjects(SubjectsCommand),

    /// Import or export the student roster
    #[command(subcommand)]
    Roster(RosterCommand),

    /// Show school totals and database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
