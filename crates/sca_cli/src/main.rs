//! `sca` command-line entry point.
//!
//! # Responsibility
//! - Parse subcommands and hand them to the core services.
//! - Print results as JSON on stdout and failures as JSON on stderr.
//!
//! # Invariants
//! - Exit code depends only on the error category: invalid 2, not found 3,
//!   conflict 4, unavailable 5.

mod commands;
mod error;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "sca", version, about = "Spy cat agency dispatch")]
pub struct Cli {
    /// Database file; overrides `SCA_DB_PATH`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Use the built-in breed list instead of TheCatAPI.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema.
    Migrate,
    /// List known breeds.
    Breeds,
    /// Manage cats.
    #[command(subcommand)]
    Cat(CatCommand),
    /// Manage missions and their targets.
    #[command(subcommand)]
    Mission(MissionCommand),
}

#[derive(Debug, Subcommand)]
pub enum CatCommand {
    Create(CreateCatArgs),
    List,
    Get {
        id: Uuid,
    },
    SetSalary {
        id: Uuid,
        #[arg(long)]
        salary_cents: i64,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Args)]
pub struct CreateCatArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub years: i64,
    #[arg(long)]
    pub breed: String,
    #[arg(long)]
    pub salary_cents: i64,
}

#[derive(Debug, Subcommand)]
pub enum MissionCommand {
    Create {
        /// Target as `name:country[:notes]`; repeatable.
        #[arg(long = "target")]
        targets: Vec<String>,
        /// Cat to assign at creation.
        #[arg(long)]
        cat: Option<Uuid>,
    },
    List,
    Get {
        id: Uuid,
    },
    Assign {
        mission: Uuid,
        cat: Uuid,
    },
    AddTargets {
        mission: Uuid,
        /// Target as `name:country[:notes]`; repeatable.
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
    },
    UpdateTarget {
        mission: Uuid,
        target: Uuid,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        complete: bool,
    },
    DeleteTarget {
        mission: Uuid,
        target: Uuid,
    },
    Complete {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("failed to render output: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{}", err.to_json());
            ExitCode::from(err.exit_code())
        }
    }
}
