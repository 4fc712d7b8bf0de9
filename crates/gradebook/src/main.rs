//! `gradebook` - CLI for the gradebook library
//!
//! Every subcommand opens the configured database, performs one operation
//! and closes it again.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Datelike, Local};
use clap::Parser;

use gradebook::catalog;
use gradebook::cli::{
    Cli, Command, ConfigCommand, EntryArgs, MarksCommand, MarksheetCommand, RosterCommand,
    SlotArgs, StatusCommand, StudentCommand, SubjectsCommand,
};
use gradebook::entry::{self, EntryCriteria};
use gradebook::render::{self, OutputFormat};
use gradebook::{
    init_logging, marking_scheme_of, marksheet, registry, roster, ClassLevel, Config, NewStudent,
    Section, Storage, StudentFilter,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err
                .downcast_ref::<gradebook::Error>()
                .is_some_and(gradebook::Error::is_persistence)
            {
                tracing::error!("{err:#}");
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    if let Command::Config(cmd) = cli.command {
        return handle_config(&config, cmd);
    }

    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("could not open database {}", path.display()))?;

    let result = match cli.command {
        Command::Student(cmd) => handle_student(&storage, cmd),
        Command::Marks(cmd) => handle_marks(&storage, cmd),
        Command::Marksheet(cmd) => handle_marksheet(&storage, &config, &cmd),
        Command::Subjects(cmd) => handle_subjects(&cmd),
        Command::Roster(cmd) => handle_roster(&storage, cmd),
        Command::Status(cmd) => handle_status(&storage, &config, &cmd),
        Command::Config(_) => Ok(()),
    };

    storage.close()?;
    result
}

fn slot(args: &SlotArgs) -> anyhow::Result<(ClassLevel, Section)> {
    Ok((ClassLevel::try_from(args.class)?, args.section.into()))
}

fn handle_student(storage: &Storage, cmd: StudentCommand) -> anyhow::Result<()> {
    match cmd {
        StudentCommand::Add { name, roll, slot: s } => {
            let (class, section) = slot(&s)?;
            let form = NewStudent::new(&name, roll, class, section)?;
            let student = registry::register(storage, &form)?;
            println!(
                "Registered {} (ID {}) as roll {} in class {}{}",
                student.name, student.id, student.roll, student.class, student.section
            );
        }
        StudentCommand::List {
            class,
            section,
            json,
        } => {
            let filter = StudentFilter {
                class: class.map(ClassLevel::try_from).transpose()?,
                section: section.map(Into::into),
            };
            let students = registry::list(storage, filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&students)?);
            } else if students.is_empty() {
                println!("No students found.");
            } else {
                println!("{:>6}  {:>5}  {:>5}  {:<7}  Name", "ID", "Class", "Roll", "Section");
                for s in &students {
                    println!(
                        "{:>6}  {:>5}  {:>5}  {:<7}  {}",
                        s.id, s.class, s.roll, s.section, s.name
                    );
                }
                println!();
                println!("{} student(s)", students.len());
            }
        }
        StudentCommand::Delete { id } => {
            registry::delete(storage, id)?;
            println!("Deleted student {id} and their marks.");
        }
    }
    Ok(())
}

fn criteria(args: &EntryArgs) -> anyhow::Result<EntryCriteria> {
    let (class, section) = slot(&args.slot)?;
    Ok(EntryCriteria::new(
        args.exam.into(),
        class,
        section,
        args.group.map(Into::into),
        &args.subject,
    )?)
}

fn handle_marks(storage: &Storage, cmd: MarksCommand) -> anyhow::Result<()> {
    match cmd {
        MarksCommand::Enter { entry: args, scores } => {
            let criteria = criteria(&args)?;
            let entries: Vec<_> = scores.iter().map(|e| (e.roll, e.scores)).collect();
            let rows = entry::resolve_rolls(storage, &criteria, &entries)?;
            let summary = entry::save_marks(storage, &criteria, &rows)?;
            println!(
                "Saved {} {} marks for class {}{} ({}): {} new, {} updated.",
                summary.saved(),
                criteria.subject,
                criteria.class,
                criteria.section,
                criteria.exam,
                summary.inserted,
                summary.updated
            );
        }
        MarksCommand::Show { entry: args, json } => {
            let criteria = criteria(&args)?;
            let sheet = entry::entry_sheet(storage, &criteria)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&sheet)?);
                return Ok(());
            }

            let scheme = criteria.scheme();
            println!(
                "{} - class {}{} - {} (Written {} / MCQ {} / Practical {})",
                criteria.subject,
                criteria.class,
                criteria.section,
                criteria.exam,
                scheme.written,
                scheme.mcq,
                scheme.practical
            );
            if sheet.is_empty() {
                println!("No students in this section.");
                return Ok(());
            }
            println!(
                "{:>5}  {:<28}{:>8}{:>6}{:>10}{:>7}",
                "Roll", "Name", "Written", "MCQ", "Practical", "Total"
            );
            for row in &sheet {
                println!(
                    "{:>5}  {:<28}{:>8}{:>6}{:>10}{:>7}",
                    row.student.roll,
                    row.student.name,
                    row.scores.theory,
                    row.scores.mcq,
                    row.scores.practical,
                    row.scores.total()
                );
            }
        }
    }
    Ok(())
}

fn handle_marksheet(storage: &Storage, config: &Config, cmd: &MarksheetCommand) -> anyhow::Result<()> {
    let (class, section) = slot(&cmd.slot)?;
    let exam = cmd.exam.into();
    let format = cmd
        .format
        .map_or(config.output.default_format, Into::into);
    let year = Local::now().year();

    let document = if let Some(roll) = cmd.roll {
        let sheet = marksheet::load_individual(storage, class, section, roll, exam)?;
        match format {
            OutputFormat::Text => render::transcript(&sheet, &config.school, year),
            OutputFormat::Json => render::transcript_json(&sheet)?,
        }
    } else {
        let sheets = marksheet::load_section(storage, class, section, exam)?;
        if sheets.is_empty() {
            anyhow::bail!("no students registered in class {class}{section}");
        }
        match format {
            OutputFormat::Text => render::section(&sheets, &config.school, year),
            OutputFormat::Json => render::section_json(&sheets)?,
        }
    };

    emit(cmd.output.as_deref(), &document)
}

fn handle_subjects(cmd: &SubjectsCommand) -> anyhow::Result<()> {
    let class = ClassLevel::try_from(cmd.class)?;
    let group = cmd.group.map(Into::into);
    let subjects = class.subjects(group);

    if cmd.json {
        let listing: Vec<_> = subjects
            .iter()
            .map(|s| serde_json::json!({ "subject": s, "scheme": marking_scheme_of(s) }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{:<30}{:>8}{:>6}{:>10}", "Subject", "Written", "MCQ", "Practical");
    for subject in &subjects {
        let scheme = marking_scheme_of(subject);
        println!(
            "{:<30}{:>8}{:>6}{:>10}",
            subject, scheme.written, scheme.mcq, scheme.practical
        );
    }

    if class.requires_group() && group.is_none() {
        let groups: Vec<&str> = catalog::groups_for(class.number())
            .iter()
            .map(|g| g.as_str())
            .collect();
        println!();
        println!("Common subjects only; pass --group for one of: {}", groups.join(", "));
    }
    Ok(())
}

fn handle_roster(storage: &Storage, cmd: RosterCommand) -> anyhow::Result<()> {
    match cmd {
        RosterCommand::Export { output } => {
            let rows = roster::export(storage)?;
            if let Some(path) = output {
                roster::write_file(&path, &rows)?;
                println!("Exported {} students to {}", rows.len(), path.display());
            } else {
                println!("{}", roster::to_json(&rows)?);
            }
        }
        RosterCommand::Import { file, policy } => {
            let forms = roster::read_file(&file)
                .with_context(|| format!("could not import {}", file.display()))?;
            let summary = roster::import(storage, &forms, policy.into())?;
            println!("Imported {} ({}):", file.display(), summary.policy);
            println!("  Rows:        {}", summary.rows);
            println!("  Removed:     {}", summary.removed);
            println!("  Inserted:    {}", summary.inserted);
            println!("  Unchanged:   {}", summary.unchanged);
            println!("  Conflicts:   {}", summary.conflicts);
        }
    }
    Ok(())
}

fn handle_status(storage: &Storage, config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let dashboard = registry::dashboard(storage)?;
    let stats = storage.stats()?;

    if cmd.json {
        let status = serde_json::json!({
            "school": config.school.name,
            "database_path": storage.path(),
            "dashboard": dashboard,
            "storage": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("gradebook status");
        println!("----------------");
        println!("School:        {}", config.school.name);
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!();
        println!("Students:      {}", dashboard.total_students);
        for (class, count) in &dashboard.students_by_class {
            println!("  Class {class:<6} {count}");
        }
        println!("Marks stored:  {}", dashboard.total_marks);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[School]");
                println!("  Name:               {}", config.school.name);
                println!("  Address:            {}", config.school.address);
                println!();
                println!("[Output]");
                println!("  Default format:     {}", config.output.default_format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn emit(output: Option<&Path>, document: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, document)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{document}"),
    }
    Ok(())
}
