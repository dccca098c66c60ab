//! Crop-window matching engine - command line runner
//!
//! Calibrates crop k values from their historical weather and ranks planting
//! windows of a forecast against the calibrated crop set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cropmatch::external::JsonFileCropStore;
use cropmatch::services::dataset::{load_crops, load_forecast, ranked_windows_csv};
use cropmatch::services::ForecastMatchingService;
use cropmatch::{compute_k_values, EngineConfig, EngineError};

#[derive(Parser, Debug)]
#[command(name = "cropmatch", about = "Match crop growth profiles against weather forecasts")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute k values for crops that carry historical weather
    Calibrate {
        /// JSON array of crops
        #[arg(long)]
        crops: PathBuf,

        /// Where to write the calibrated crops (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Where to write the calibration log
        #[arg(long)]
        log: Option<PathBuf>,

        /// JSON document merged over the loaded configuration
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
    /// Rank forecast windows for every calibrated crop
    Match {
        /// JSON array of calibrated crops
        #[arg(long)]
        crops: PathBuf,

        /// Forecast series, JSON or CSV
        #[arg(long)]
        forecast: PathBuf,

        /// Where to write results and log (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Where to write the ranked windows as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// JSON document merged over the loaded configuration
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    if let Err(err) = run(args.command).await {
        let code = err
            .downcast_ref::<EngineError>()
            .map_or("ERROR", EngineError::code);
        tracing::error!(code, "{:#}", err);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Calibrate {
            crops,
            out,
            log,
            overrides,
        } => {
            let config = load_config(overrides.as_deref())?;
            let crops = load_crops(&crops)
                .with_context(|| format!("Failed to read crops from {}", crops.display()))?;

            let outcome = compute_k_values(&crops, &config.calibration.base_importance)?;
            for error in &outcome.log.errors {
                tracing::warn!("{}", error);
            }

            write_json(out.as_deref(), &outcome.crops)?;
            if let Some(log) = log {
                write_json(Some(log.as_path()), &outcome.log)?;
            }
        }
        Command::Match {
            crops,
            forecast,
            out,
            csv,
            overrides,
        } => {
            let config = load_config(overrides.as_deref())?;
            let forecast = load_forecast(&forecast)
                .with_context(|| format!("Failed to read forecast from {}", forecast.display()))?;

            let store = Arc::new(JsonFileCropStore::new(crops));
            let service = ForecastMatchingService::new(store, config);
            let report = service.match_forecast(forecast).await?;

            for error in &report.outcome.log.errors {
                tracing::warn!("{}", error);
            }
            if let Some(csv) = csv {
                std::fs::write(&csv, ranked_windows_csv(&report.outcome.results)?)
                    .with_context(|| format!("Failed to write {}", csv.display()))?;
            }
            write_json(out.as_deref(), &report.outcome)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cropmatch=info".into());

    // Diagnostics go to stderr so stdout stays clean JSON
    if std::env::var_os("CROPMATCH_LOG_JSON").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(overrides: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = EngineConfig::load()?;
    let Some(path) = overrides else {
        return Ok(config);
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read overrides from {}", path.display()))?;
    Ok(config.with_overrides(&json)?)
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => println!("{}", json),
    }
    Ok(())
}
