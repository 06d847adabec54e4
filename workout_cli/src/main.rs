use std::{fs::OpenOptions, path::PathBuf};

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use console::{format_details, format_entry, ConsolePresenter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker_data_management::{
    persistence::FileBlobStore, IntentOutcome, SaveStatus, WorkoutManager, LOG_DIR,
};
use workout_tracker_lib::{
    presentation::Intent,
    workout::{Location, WorkoutKind, WorkoutPayload},
};

mod console;

// CLI for logging and editing workouts
#[derive(Parser)]
#[command(name = "workouts")]
#[command(about = "Log running and cycling workouts", long_about = None)]
struct Cli {
    /// Blob file to use instead of the one in the project data directory
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new workout at a location
    #[command(allow_negative_numbers = true)]
    New {
        kind: WorkoutKind,
        latitude: f64,
        longitude: f64,
        distance_km: f64,
        duration_min: f64,
        /// Cadence in spm for running, elevation gain in m for cycling
        value: f64,
    },
    /// Change the facts of a workout. Omitted values are kept
    #[command(allow_negative_numbers = true)]
    Edit {
        id: String,
        #[arg(long)]
        distance_km: Option<f64>,
        #[arg(long)]
        duration_min: Option<f64>,
        #[arg(long)]
        value: Option<f64>,
    },
    /// Select a workout, centring the map on it
    Select { id: String },
    /// List all workouts in display order
    List,
    /// Show everything stored about a workout
    Show { id: String },
    /// Remove all workouts. BE CAREFUL
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let persistence = match &cli.data_file {
        Some(path) => FileBlobStore::new(path),
        None => FileBlobStore::open_default()?,
    };
    tracing::debug!("Using workouts at {:?}", persistence.path());

    let (mut manager, report) = WorkoutManager::start(persistence, ConsolePresenter::new(false)).await;
    if let Some(err) = &report.error {
        eprintln!("Saved workouts could not be read, starting empty: {err}");
    }
    manager.presenter_mut().set_echo(true);

    match cli.command {
        Commands::New {
            kind,
            latitude,
            longitude,
            distance_km,
            duration_min,
            value,
        } => {
            let payload = WorkoutPayload {
                kind,
                location: Location::new(latitude, longitude),
                distance_km,
                duration_min,
                kind_specific_value: value,
            };
            let outcome = manager.handle(Intent::SubmitNew(payload)).await?;
            warn_if_unsaved(&outcome);
        }
        Commands::Edit {
            id,
            distance_km,
            duration_min,
            value,
        } => {
            let IntentOutcome::EditStarted { prefill, .. } = manager.handle(Intent::RequestEdit(id)).await? else {
                bail!("Edit did not start");
            };

            let payload = WorkoutPayload {
                distance_km: distance_km.unwrap_or(prefill.distance_km),
                duration_min: duration_min.unwrap_or(prefill.duration_min),
                kind_specific_value: value.unwrap_or(prefill.kind_specific_value),
                ..prefill
            };

            match manager.handle(Intent::SubmitNew(payload)).await {
                Ok(outcome) => warn_if_unsaved(&outcome),
                Err(err) => {
                    manager.cancel();
                    return Err(err.into());
                }
            }
        }
        Commands::Select { id } => {
            let outcome = manager.handle(Intent::Select(id)).await?;
            warn_if_unsaved(&outcome);
        }
        Commands::List => {
            for workout in manager.store().all() {
                println!("{}", format_entry(workout));
            }
        }
        Commands::Show { id } => {
            let workout = manager
                .store()
                .find_by_id(&id)
                .ok_or_else(|| anyhow!("No workout with id {id}"))?;
            println!("{}", format_details(workout));
        }
        Commands::Reset => {
            manager.reset().await?;
        }
    }

    Ok(())
}

fn warn_if_unsaved(outcome: &IntentOutcome) {
    let save = match outcome {
        IntentOutcome::Created { save, .. }
        | IntentOutcome::Replaced { save, .. }
        | IntentOutcome::Selected { save, .. } => save,
        IntentOutcome::EditStarted { .. } | IntentOutcome::Cancelled { .. } => return,
    };

    if let SaveStatus::Failed(err) = save {
        eprintln!("Change was not saved: {err}");
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let root: PathBuf = project_root::get_project_root().unwrap_or_default();
    let log_dir = root.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("workouts.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=info,workout_tracker_data_management=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    Ok(())
}
