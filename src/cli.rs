//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_snapshot_adapter::CsvSnapshotAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_history_adapter::JsonHistoryAdapter;
use crate::domain::analysis::{
    AnalysisSummary, IndicatorBreakdown, ScoreKind, analysis_summary, compare_markets,
    indicator_breakdown, score_trend,
};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::composite::TimingIndicatorRecord;
use crate::domain::config_validation::validate_scoring_config;
use crate::domain::engine::TimingEngine;
use crate::domain::error::TimingError;
use crate::domain::position::{DEFAULT_AVAILABLE_CAPITAL, DEFAULT_RISK_PER_TRADE_PCT, SizingRequest};
use crate::domain::scoring_config::ScoringConfig;
use crate::domain::summary::{CachedSummarizer, Narrative, RuleBasedSummarizer, SummarySettings};
use crate::ports::history_port::HistoryPort;
use crate::ports::snapshot_port::SnapshotPort;
use crate::ports::summary_port::SummaryPort;
use std::sync::Arc;

pub const DEFAULT_MARKET: &str = "a_share";
pub const DEFAULT_MARKETS: &str = "a_share,hong_kong,nasdaq";

#[derive(Parser, Debug)]
#[command(name = "timescore", about = "Market timing scores and position sizing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score market snapshots from a CSV file
    Score {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        market: Option<String>,
        /// Print records without appending them to history
        #[arg(long)]
        no_save: bool,
    },
    /// Size a position for a timing score
    Size {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        score: f64,
        #[arg(long, default_value = DEFAULT_MARKET)]
        market: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = DEFAULT_AVAILABLE_CAPITAL)]
        capital: f64,
        #[arg(long, default_value_t = DEFAULT_RISK_PER_TRADE_PCT)]
        risk_pct: f64,
    },
    /// Position sizing for scores 0 to 100 in steps of 10
    Sweep {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_MARKET)]
        market: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = DEFAULT_AVAILABLE_CAPITAL)]
        capital: f64,
        #[arg(long, default_value_t = DEFAULT_RISK_PER_TRADE_PCT)]
        risk_pct: f64,
    },
    /// Validate a scoring configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored timing records for a market
    History {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_MARKET)]
        market: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Print a score trend (overall, macro, industry, sentiment) instead of records
        #[arg(long)]
        trend: Option<String>,
    },
    /// Rank markets by their latest overall score
    Compare {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_MARKETS)]
        markets: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Summarize the latest record for a market
    Summary {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_MARKET)]
        market: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Score {
            config,
            input,
            market,
            no_save,
        } => run_score(config.as_ref(), &input, market.as_deref(), no_save),
        Command::Size {
            config,
            score,
            market,
            date,
            capital,
            risk_pct,
        } => run_size(config.as_ref(), score, &market, date, capital, risk_pct),
        Command::Sweep {
            config,
            market,
            date,
            capital,
            risk_pct,
        } => run_sweep(config.as_ref(), &market, date, capital, risk_pct),
        Command::Validate { config } => run_validate(&config),
        Command::History {
            config,
            market,
            start,
            end,
            trend,
        } => run_history(config.as_ref(), &market, start, end, trend.as_deref()),
        Command::Compare {
            config,
            markets,
            date,
        } => run_compare(config.as_ref(), &markets, date),
        Command::Summary { config, market } => run_summary(config.as_ref(), &market),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let loaded = match path {
        Some(path) => {
            info!("loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| e.to_string())
        }
        None => FileConfigAdapter::from_string(""),
    };
    loaded.map_err(|reason| {
        let err = TimingError::ConfigParse {
            file: path.map(|p| p.display().to_string()).unwrap_or_default(),
            reason,
        };
        report_error(&err)
    })
}

fn report_error(err: &TimingError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&TimingError::from(e)),
    }
}

/// Build an engine from config, refusing configurations with validation errors.
pub fn build_engine(adapter: &FileConfigAdapter) -> Result<TimingEngine, TimingError> {
    let config = ScoringConfig::from_port(adapter);
    let report = validate_scoring_config(&config);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if let Some(first) = report.errors.first() {
        return Err(TimingError::ConfigInvalid {
            section: "strength_thresholds".into(),
            key: "*".into(),
            reason: first.clone(),
        });
    }
    Ok(TimingEngine::new(config))
}

/// Score every snapshot, appending each record to `history` when given.
pub fn score_snapshots(
    engine: &TimingEngine,
    snapshots: &dyn SnapshotPort,
    market: Option<&str>,
    history: Option<&dyn HistoryPort>,
) -> Result<Vec<TimingIndicatorRecord>, TimingError> {
    let snapshots = snapshots.fetch_snapshots(market)?;
    if snapshots.is_empty() {
        return Err(TimingError::NoData {
            market: market.unwrap_or("any").to_string(),
        });
    }

    // every snapshot must score before anything is stored
    let records = snapshots
        .iter()
        .map(|s| engine.score_snapshot(s))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(history) = history {
        for record in &records {
            let id = history.append(record)?;
            info!(id = id.as_str(), market = record.market.as_str(), "saved timing record");
        }
    }
    Ok(records)
}

fn today() -> NaiveDate {
    SystemClock.now().date_naive()
}

fn run_score(
    config_path: Option<&PathBuf>,
    input: &PathBuf,
    market: Option<&str>,
    no_save: bool,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let engine = match build_engine(&adapter) {
        Ok(e) => e,
        Err(e) => return report_error(&e),
    };

    let snapshots = CsvSnapshotAdapter::new(input.clone());
    let history = JsonHistoryAdapter::from_config(&adapter);
    let history_port: Option<&dyn HistoryPort> = if no_save { None } else { Some(&history) };

    match score_snapshots(&engine, &snapshots, market, history_port) {
        Ok(records) => print_json(&records),
        Err(e) => report_error(&e),
    }
}

fn run_size(
    config_path: Option<&PathBuf>,
    score: f64,
    market: &str,
    date: Option<NaiveDate>,
    capital: f64,
    risk_pct: f64,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let engine = match build_engine(&adapter) {
        Ok(e) => e,
        Err(e) => return report_error(&e),
    };

    let request = SizingRequest::new(market, date.unwrap_or_else(today), score)
        .with_capital(capital)
        .with_risk_pct(risk_pct);
    match engine.compute_position_sizing(&request) {
        Ok(result) => print_json(&result),
        Err(e) => report_error(&e),
    }
}

fn run_sweep(
    config_path: Option<&PathBuf>,
    market: &str,
    date: Option<NaiveDate>,
    capital: f64,
    risk_pct: f64,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let engine = match build_engine(&adapter) {
        Ok(e) => e,
        Err(e) => return report_error(&e),
    };

    let base = SizingRequest::new(market, date.unwrap_or_else(today), 0.0)
        .with_capital(capital)
        .with_risk_pct(risk_pct);
    match engine.position_sizing_sweep(&base) {
        Ok(results) => print_json(&results),
        Err(e) => report_error(&e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(Some(config_path)) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let report = validate_scoring_config(&ScoringConfig::from_port(&adapter));
    let code = print_json(&report);
    if report.is_valid() {
        eprintln!("Config validated with {} warning(s)", report.warnings.len());
        code
    } else {
        eprintln!("error: config has {} error(s)", report.errors.len());
        ExitCode::from(2)
    }
}

fn run_history(
    config_path: Option<&PathBuf>,
    market: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    trend: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let kind = match trend.map(|t| ScoreKind::parse(t).ok_or(t)) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(t)) => {
            return report_error(&TimingError::InvalidInput {
                field: "trend".into(),
                reason: format!("unknown score kind '{t}'"),
            });
        }
    };

    let history = JsonHistoryAdapter::from_config(&adapter);
    let records = match history.list(market, start, end) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };

    match kind {
        Some(kind) => print_json(&score_trend(&records, kind)),
        None => print_json(&records),
    }
}

/// Latest stored record for each requested market; markets without history are skipped.
pub fn latest_records(
    history: &dyn HistoryPort,
    markets: &[String],
) -> Result<Vec<TimingIndicatorRecord>, TimingError> {
    let mut records = Vec::new();
    for market in markets {
        match history.latest(market.trim())? {
            Some(record) => records.push(record),
            None => warn!(market = market.as_str(), "no stored timing data, skipping"),
        }
    }
    Ok(records)
}

fn run_compare(config_path: Option<&PathBuf>, markets: &[String], date: Option<NaiveDate>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let history = JsonHistoryAdapter::from_config(&adapter);
    match latest_records(&history, markets) {
        Ok(records) => print_json(&compare_markets(&records, date.unwrap_or_else(today))),
        Err(e) => report_error(&e),
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub analysis: AnalysisSummary,
    pub breakdown: IndicatorBreakdown,
    pub narrative: Narrative,
}

pub fn build_summary_report(
    history: &dyn HistoryPort,
    summarizer: &dyn SummaryPort,
    market: &str,
) -> Result<SummaryReport, TimingError> {
    let record = history.latest(market)?.ok_or_else(|| TimingError::NoData {
        market: market.to_string(),
    })?;
    Ok(SummaryReport {
        analysis: analysis_summary(&record),
        breakdown: indicator_breakdown(&record),
        narrative: summarizer.summarize(&record)?,
    })
}

/// Rule-based narratives behind the `[summary]` cache settings.
pub fn build_summarizer(
    adapter: &FileConfigAdapter,
    clock: Arc<dyn Clock>,
) -> CachedSummarizer<RuleBasedSummarizer> {
    CachedSummarizer::new(
        RuleBasedSummarizer::new(Arc::clone(&clock)),
        SummarySettings::from_port(adapter),
        clock,
    )
}

fn run_summary(config_path: Option<&PathBuf>, market: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let history = JsonHistoryAdapter::from_config(&adapter);
    let summarizer = build_summarizer(&adapter, Arc::new(SystemClock));
    match build_summary_report(&history, &summarizer, market) {
        Ok(report) => print_json(&report),
        Err(e) => report_error(&e),
    }
}
