use crate::api::{ClientOptions, HttpMarketApi, MarketApi, DEFAULT_BASE_URL};
use crate::config::{
    AppConfig, ConfigPatch, ConfigStore, HistoricalQuery, OptimizationConfig, PredictionConfig,
    TimeRange, UploadOptions,
};
use crate::export;
use crate::model::{ModelId, RunRecord, ServiceStatus};
use crate::storage;
use crate::text_summary;
use crate::workflow::WorkflowController;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::RngCore;
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "power-market-cli",
    version,
    about = "Power-market analytics workflow client: upload, predict, optimize"
)]
pub struct Cli {
    /// Base URL for the power-market analytics service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout for predict/optimize/status requests
    #[arg(long, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// Timeout for dataset uploads
    #[arg(long, default_value = "120s")]
    pub upload_timeout: humantime::Duration,

    /// Print JSON instead of a text summary
    #[arg(long)]
    pub json: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Drive the full workflow: upload a dataset, predict prices, optimize bids
    Run(RunArgs),
    /// Show the service's dataset and algorithm status
    Status,
    /// Fetch historical prices for a time window
    Prices(PricesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Dataset file to upload (.xlsx, .xls or .csv)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Forecast start date (YYYY-MM-DD); defaults to the day after the
    /// service's stored data ends
    #[arg(long, value_parser = parse_cli_date)]
    pub date: Option<Date>,

    /// Forecast horizon in points (1..=168)
    #[arg(long, alias = "horizon", default_value_t = 96)]
    pub points: u32,

    /// Confidence level for the forecast band (0.80..=0.99)
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Models to request, comma-separated (aliases rf, xgb, gb, lr accepted)
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [
            ModelId::RandomForest,
            ModelId::Xgboost,
            ModelId::GradientBoosting,
            ModelId::LinearRegression,
        ]
    )]
    pub models: Vec<ModelId>,

    /// Generation cost used by the bid optimizer
    #[arg(long, default_value_t = 375.0)]
    pub cost_gen: f64,

    /// Upward regulation cost used by the bid optimizer
    #[arg(long, default_value_t = 530.0)]
    pub cost_up: f64,

    /// Downward regulation cost used by the bid optimizer
    #[arg(long, default_value_t = 310.0)]
    pub cost_down: f64,

    /// Attach custom comments to this run
    #[arg(long)]
    pub comments: Option<String>,

    /// Export the forecast as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Export the bidding schedule as CSV
    #[arg(long)]
    pub export_schedule: Option<PathBuf>,

    /// Export the run record as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PricesArgs {
    /// Time window to fetch: 1d, 7d, 30d or all
    #[arg(long, default_value = "1d")]
    pub range: TimeRange,

    /// Also fetch the model predictions aligned with the window
    #[arg(long)]
    pub include_predictions: bool,

    /// Export the series as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,
}

fn parse_cli_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", raw))
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    match args.command.clone() {
        Command::Run(run_args) => run_workflow(&args, &run_args).await,
        Command::Status => show_status(&args).await,
        Command::Prices(prices_args) => show_prices(&args, &prices_args).await,
    }
}

/// Random hex id carried by the run record and its auto-saved file name.
fn gen_run_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}

fn build_api(args: &Cli) -> Result<HttpMarketApi> {
    let options = ClientOptions {
        base_url: args.base_url.clone(),
        request_timeout: args.request_timeout.into(),
        upload_timeout: args.upload_timeout.into(),
        ..ClientOptions::default()
    };
    HttpMarketApi::new(&options).context("build HTTP client")
}

/// Build the validated config snapshot a run starts from.
fn config_from_args(run_args: &RunArgs) -> AppConfig {
    AppConfig {
        upload: UploadOptions {
            source: Some(run_args.dataset.clone()),
        },
        prediction: PredictionConfig {
            prediction_date: run_args.date,
            horizon_points: run_args.points,
            confidence_level: run_args.confidence,
            models: run_args.models.clone(),
        },
        optimization: OptimizationConfig {
            cost_generation: run_args.cost_gen,
            cost_upward: run_args.cost_up,
            cost_downward: run_args.cost_down,
        },
        historical: HistoricalQuery::default(),
    }
}

/// Day after the service's stored data ends, if status reports a range.
fn seeded_date(status: &ServiceStatus) -> Option<Date> {
    status.time_range.and_then(|r| r.end.date().next_day())
}

/// Fill in the forecast date from service status when the caller gave none.
/// A status failure downgrades to an undated request; the service then picks
/// its own default.
async fn seed_forecast_date(api: &dyn MarketApi, store: &mut ConfigStore) -> Result<()> {
    match api.status().await {
        Ok(status) => {
            if let Some(seeded) = seeded_date(&status) {
                let mut prediction = store.get().prediction;
                prediction.prediction_date = Some(seeded);
                store
                    .apply(ConfigPatch {
                        prediction: Some(prediction),
                        ..ConfigPatch::default()
                    })
                    .context("seed forecast date")?;
                info!("forecast date seeded to {} from service status", seeded);
            }
        }
        Err(e) => {
            warn!("status unavailable, the service will pick the forecast date: {}", e);
        }
    }
    Ok(())
}

async fn run_workflow(args: &Cli, run_args: &RunArgs) -> Result<()> {
    let mut store = ConfigStore::new(config_from_args(run_args)).context("invalid run parameters")?;
    let api = Arc::new(build_api(args)?);
    let controller = WorkflowController::new(api.clone());

    if run_args.date.is_none() {
        seed_forecast_date(api.as_ref(), &mut store).await?;
    }

    let config = store.get();
    let source = config
        .upload
        .source
        .as_deref()
        .context("no dataset file configured")?;

    let dataset = controller.start_upload(source).await?;
    if !dataset.is_valid {
        return Err(anyhow::anyhow!(
            "dataset validation failed (missing {} columns); prediction not attempted",
            dataset.undetected_columns().join(" and ")
        ));
    }
    controller.run_prediction(&config.prediction).await?;
    controller.run_optimization(&config.optimization).await?;

    let record = RunRecord {
        timestamp_utc: now_rfc3339(),
        base_url: args.base_url.clone(),
        run_id: gen_run_id(),
        comments: run_args.comments.clone(),
        prediction_config: config.prediction,
        optimization_config: config.optimization,
        snapshot: controller.snapshot().await,
    };

    handle_exports(run_args, &record)?;

    if args.json {
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    } else {
        for line in text_summary::build_run_summary(&record).lines {
            println!("{}", line);
        }
    }

    if run_args.auto_save {
        let path = storage::save_run(&record).context("failed to save run record")?;
        if !args.silent {
            eprintln!("Saved: {}", path.display());
        }
    }

    Ok(())
}

/// Handle export operations for a completed run.
fn handle_exports(run_args: &RunArgs, record: &RunRecord) -> Result<()> {
    if let Some(path) = run_args.export_json.as_deref() {
        storage::export_json(path, record)?;
    }
    if let Some(path) = run_args.export_csv.as_deref() {
        if let Some(prediction) = record.snapshot.prediction.as_ref() {
            let csv = export::to_csv(&export::prediction_rows(&prediction.points))
                .context("render forecast CSV")?;
            storage::export_csv(path, &csv)?;
        }
    }
    if let Some(path) = run_args.export_schedule.as_deref() {
        if let (Some(prediction), Some(strategy)) = (
            record.snapshot.prediction.as_ref(),
            record.snapshot.optimization.as_ref(),
        ) {
            let csv = export::to_csv(&export::schedule_rows(&prediction.points, strategy))
                .context("render bidding schedule CSV")?;
            storage::export_csv(path, &csv)?;
        }
    }
    Ok(())
}

async fn show_status(args: &Cli) -> Result<()> {
    let api = build_api(args)?;
    let status = api.status().await.context("fetch service status")?;

    if args.json {
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    } else {
        for line in text_summary::build_status_summary(&status).lines {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn show_prices(args: &Cli, prices_args: &PricesArgs) -> Result<()> {
    let api = build_api(args)?;
    let query = HistoricalQuery {
        time_range: prices_args.range,
        include_predictions: prices_args.include_predictions,
    };
    let series = api
        .historical_prices(&query)
        .await
        .context("fetch historical prices")?;

    if let Some(path) = prices_args.export_csv.as_deref() {
        let csv = export::to_csv(&export::historical_rows(&series))
            .context("render historical CSV")?;
        storage::export_csv(path, &csv)?;
        if !args.silent {
            eprintln!("Exported CSV: {}", path.display());
        }
    }

    if args.json {
        if !args.silent {
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    } else {
        for line in text_summary::build_prices_summary(&series, prices_args.range).lines {
            println!("{}", line);
        }
    }
    Ok(())
}
