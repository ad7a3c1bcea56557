pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use commands::{
    assess::run_assessment,
    history::get_history,
    settings::{get_settings, load_effective_settings, save_settings},
    workspace::open_workspace,
};
use error::{GrowthError, Result};
use models::measurement::AssessmentRequest;
use models::profile::Sex;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "growthlens")]
#[command(version)]
#[command(about = "WHO length/height-for-age Z-scores and stunting history for children under five", long_about = None)]
struct Cli {
    /// Workspace holding .growthlens/ state and the reference tables directory
    #[arg(short, long, default_value = ".", global = true)]
    workspace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create workspace state and print its metadata
    Init,

    /// Assess one height measurement and record it in the history
    Assess {
        /// Length/height in centimetres
        #[arg(long)]
        height: f64,

        /// Child's name (defaults to the configured profile)
        #[arg(long)]
        name: Option<String>,

        /// male or female (defaults to the configured profile)
        #[arg(long)]
        sex: Option<Sex>,

        /// YYYY-MM-DD (defaults to the configured profile)
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// YYYY-MM-DDTHH:MM:SS, defaults to now
        #[arg(long)]
        measured_at: Option<NaiveDateTime>,
    },

    /// Print measurement history, summary and trend
    History,

    /// Show settings, or merge a JSON object into them
    Settings {
        #[arg(long)]
        set: Option<String>,
    },
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
    message: String,
}

pub fn run() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => open_workspace(&cli.workspace).and_then(|meta| print_json(&meta)),
        Commands::Assess {
            height,
            name,
            sex,
            birth_date,
            measured_at,
        } => {
            return assess(&cli.workspace, height, name, sex, birth_date, measured_at);
        }
        Commands::History => get_history(&cli.workspace).and_then(|report| print_json(&report)),
        Commands::Settings { set } => match set {
            Some(raw) => serde_json::from_str::<serde_json::Value>(&raw)
                .map_err(|e| GrowthError::Settings(format!("--set is not valid JSON: {e}")))
                .and_then(|incoming| save_settings(&cli.workspace, incoming))
                .and_then(|saved| print_json(&saved)),
            None => get_settings(&cli.workspace).and_then(|settings| print_json(&settings)),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn assess(
    workspace: &str,
    height_cm: f64,
    name: Option<String>,
    sex: Option<Sex>,
    birth_date: Option<NaiveDate>,
    measured_at: Option<NaiveDateTime>,
) -> ExitCode {
    let request = match build_request(workspace, height_cm, name, sex, birth_date, measured_at) {
        Ok(request) => request,
        Err(err) => {
            report_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match run_assessment(workspace, &request) {
        Ok(outcome) => outcome,
        Err(err) => {
            report_error(&err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = print_json(&outcome.assessment) {
        report_error(&err);
        return ExitCode::FAILURE;
    }

    match outcome.recorded {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(2)
        }
    }
}

fn build_request(
    workspace: &str,
    height_cm: f64,
    name: Option<String>,
    sex: Option<Sex>,
    birth_date: Option<NaiveDate>,
    measured_at: Option<NaiveDateTime>,
) -> Result<AssessmentRequest> {
    let profile = load_effective_settings(workspace)?.profile;
    let missing = |field: &str| {
        GrowthError::Settings(format!("--{field} not given and no profile is configured"))
    };

    Ok(AssessmentRequest {
        subject_name: name
            .or_else(|| profile.as_ref().map(|p| p.name.clone()))
            .ok_or_else(|| missing("name"))?,
        sex: sex
            .or_else(|| profile.as_ref().map(|p| p.sex))
            .ok_or_else(|| missing("sex"))?,
        birth_date: birth_date
            .or_else(|| profile.as_ref().map(|p| p.birth_date))
            .ok_or_else(|| missing("birth-date"))?,
        measured_at: measured_at.unwrap_or_else(|| chrono::Local::now().naive_local()),
        height_cm,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| GrowthError::Output(format!("Failed to serialize output: {e}")))
}

/// One JSON line on stderr per error.
fn report_error(err: &GrowthError) {
    let report = ErrorReport {
        error: err.kind(),
        message: err.to_string(),
    };
    match serde_json::to_string(&report) {
        Ok(raw) => eprintln!("{raw}"),
        Err(_) => eprintln!("{err}"),
    }
}
