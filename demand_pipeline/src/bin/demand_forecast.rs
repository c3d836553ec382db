use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use demand_ingestor::{
    io::{
        ledger_sink::{JsonFileSink, LedgerPredictionSink},
        sink::PredictionSink,
    },
    providers::{
        holidays::FeiertageProvider, ledger_rest::LedgerRestProvider,
        vacations::FerienProvider, world_weather::WorldWeatherProvider,
    },
};
use demand_pipeline::{
    config::load_config_path,
    context::RunContext,
    pipeline::{RunSettings, Sources, run},
    regressor::ModelRegistry,
    safety::SafetyFactors,
    tz::today_in,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Demand forecast CLI")]
struct Cli {
    #[arg(long, value_name = "FILE", default_value = "forecast.toml")]
    config: PathBuf,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Forecast, explain, and optionally store the result.
    Run {
        /// Overrides run.pred_duration.
        #[arg(long)]
        duration: Option<u32>,
        /// Overrides run.start_date (YYYY-MM-DD).
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Replace the ledger's stored predictions with this run's.
        #[arg(long)]
        upload: bool,
        /// Also write the table as JSON.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_pipeline=info,demand_ingestor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Run {
            duration,
            start_date,
            upload,
            output,
        } => {
            // 1) Config
            let (mut cfg, report) = load_config_path(&cli.config)?;
            info!(?report, "configuration normalized");
            cfg.apply_env_overrides();
            if let Some(duration) = duration {
                cfg.run.pred_duration = duration;
            }
            if let Some(start_date) = start_date {
                cfg.run.start_date = start_date;
            }
            let settings = RunSettings::from_config(&cfg)?;

            // 2) Sources
            let ledger = LedgerRestProvider::new(cfg.server_link()?)?;
            let sources = Sources {
                ledger: Arc::new(ledger.clone()),
                locations: Arc::new(ledger.clone()),
                holidays: Arc::new(FeiertageProvider::new(&cfg.sources.holiday_url)?),
                vacations: Arc::new(FerienProvider::new(&cfg.sources.vacation_url)?),
                weather: Arc::new(WorldWeatherProvider::new(
                    &cfg.sources.weather_url,
                    cfg.sources.weather_requests_per_second,
                )?),
            };

            // 3) Artifacts
            let registry = ModelRegistry::load(&cfg.artifacts.models).with_context(|| {
                format!("loading models from {}", cfg.artifacts.models.display())
            })?;
            let safety = SafetyFactors::load(&cfg.artifacts.safety_factors).with_context(|| {
                format!(
                    "loading safety factors from {}",
                    cfg.artifacts.safety_factors.display()
                )
            })?;

            // 4) Run
            let mut ctx = RunContext::new(today_in(cfg.timezone()?));
            let out = run(&sources, &settings, &registry, &safety, &mut ctx).await?;

            for line in &out.summary {
                println!("{}\t{:.2}", line.article, line.mean_prediction);
            }

            // 5) Outputs
            if let Some(path) = output {
                JsonFileSink::new(path).replace(&out.records).await?;
            }
            if upload {
                let stored = LedgerPredictionSink::new(ledger)
                    .replace(&out.records)
                    .await?;
                info!(stored, "predictions uploaded");
            }
        }
    }

    Ok(())
}
