//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Engine construction from INI files on disk
//! - `score` against a CSV file with history written to a temp directory

mod common;

use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use timescore::adapters::file_config_adapter::FileConfigAdapter;
use timescore::adapters::json_history_adapter::JsonHistoryAdapter;
use timescore::cli::{self, Cli, Command};
use timescore::domain::error::TimingError;
use timescore::domain::strength::StrengthLevel;
use timescore::ports::history_port::HistoryPort;

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

const SNAPSHOT_CSV: &str = "\
market,date,macro.pmi,macro.cpi,industry.industry_sentiment,sentiment.investor_sentiment,sentiment.rsi
a_share,2024-01-15,50.5,2.1,70,65,55
nasdaq,2024-01-15,,,,90,
";

fn config_with_history(dir: &Path) -> std::path::PathBuf {
    let ini = format!(
        "[weights]\nmacro = 0.4\nindustry = 0.3\nsentiment = 0.3\n\n[history]\npath = {}\n",
        dir.join("history.json").display()
    );
    write_file(dir, "timescore.ini", &ini)
}

mod parsing {
    use super::*;

    #[test]
    fn score_arguments() {
        let cli = Cli::try_parse_from([
            "timescore", "score", "-c", "cfg.ini", "-i", "in.csv", "--market", "nasdaq", "--no-save",
        ])
        .unwrap();
        match cli.command {
            Command::Score {
                config,
                input,
                market,
                no_save,
            } => {
                assert_eq!(config.unwrap().to_str(), Some("cfg.ini"));
                assert_eq!(input.to_str(), Some("in.csv"));
                assert_eq!(market.as_deref(), Some("nasdaq"));
                assert!(no_save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn size_defaults() {
        let cli = Cli::try_parse_from(["timescore", "size", "--score", "82"]).unwrap();
        match cli.command {
            Command::Size {
                score,
                market,
                date,
                capital,
                risk_pct,
                ..
            } => {
                assert_eq!(score, 82.0);
                assert_eq!(market, "a_share");
                assert!(date.is_none());
                assert_eq!(capital, 100_000.0);
                assert_eq!(risk_pct, 2.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn compare_splits_markets() {
        let cli = Cli::try_parse_from(["timescore", "compare", "--markets", "a_share,nasdaq", "--date", "2024-01-31"])
            .unwrap();
        match cli.command {
            Command::Compare { markets, date, .. } => {
                assert_eq!(markets, vec!["a_share", "nasdaq"]);
                assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2024, 1, 31));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["timescore", "history", "--start", "15/01/2024"]).is_err());
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["timescore", "validate"]).is_err());
    }
}

mod engine_from_config {
    use super::*;

    #[test]
    fn default_config_builds() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        assert!(cli::build_engine(&adapter).is_ok());
    }

    #[test]
    fn broken_thresholds_are_refused() {
        let adapter =
            FileConfigAdapter::from_string("[strength_thresholds]\nvery_strong = 50\nstrong = 60\n").unwrap();
        let err = cli::build_engine(&adapter).err().unwrap();
        assert!(matches!(err, TimingError::ConfigInvalid { .. }));
    }

    #[test]
    fn weight_warnings_do_not_block() {
        let adapter = FileConfigAdapter::from_string("[weights]\nmacro = 0.9\n").unwrap();
        let engine = cli::build_engine(&adapter).unwrap();
        assert_eq!(engine.config().weights.macro_weight, 0.9);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(cli::load_config(Some(&dir.path().join("absent.ini"))).is_err());
    }
}

mod score_command {
    use super::*;

    #[test]
    fn score_writes_history() {
        let dir = TempDir::new().unwrap();
        let config = config_with_history(dir.path());
        let input = write_file(dir.path(), "snapshots.csv", SNAPSHOT_CSV);

        cli::run(Cli::parse_from([
            "timescore",
            "score",
            "-c",
            config.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
        ]));

        let history = JsonHistoryAdapter::new(dir.path().join("history.json"));
        let a_share = history.latest("a_share").unwrap().unwrap();
        let nasdaq = history.latest("nasdaq").unwrap().unwrap();
        // nasdaq: 50*0.4 + 50*0.3 + 90*0.3
        assert_eq!(nasdaq.overall_score, 62.0);
        assert_eq!(nasdaq.strength_level, StrengthLevel::Strong);
        assert!(a_share.overall_score > nasdaq.overall_score);

        let raw = fs::read_to_string(dir.path().join("history.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["timing_indicators"].as_array().unwrap().len(), 2);
        assert!(json["metadata"]["last_updated"].is_string());
    }

    #[test]
    fn no_save_leaves_history_untouched() {
        let dir = TempDir::new().unwrap();
        let config = config_with_history(dir.path());
        let input = write_file(dir.path(), "snapshots.csv", SNAPSHOT_CSV);

        cli::run(Cli::parse_from([
            "timescore",
            "score",
            "-c",
            config.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "--no-save",
        ]));

        assert!(!dir.path().join("history.json").exists());
    }

    #[test]
    fn market_filter_saves_only_that_market() {
        let dir = TempDir::new().unwrap();
        let config = config_with_history(dir.path());
        let input = write_file(dir.path(), "snapshots.csv", SNAPSHOT_CSV);

        cli::run(Cli::parse_from([
            "timescore",
            "score",
            "-c",
            config.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "--market",
            "nasdaq",
        ]));

        let history = JsonHistoryAdapter::new(dir.path().join("history.json"));
        assert!(history.latest("a_share").unwrap().is_none());
        assert_eq!(history.list("nasdaq", None, None).unwrap().len(), 1);
    }
}

mod summary_command {
    use super::*;
    use std::sync::Arc;
    use timescore::domain::clock::ManualClock;
    use timescore::domain::snapshot::MarketSnapshot;
    use timescore::ports::summary_port::SummaryPort;

    fn nasdaq_record() -> timescore::domain::composite::TimingIndicatorRecord {
        common::fixed_engine()
            .score_snapshot(&MarketSnapshot::new("nasdaq", common::date(2024, 1, 15)))
            .unwrap()
    }

    #[test]
    fn summarizer_caches_by_default() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        let summarizer = cli::build_summarizer(&adapter, Arc::new(ManualClock::new(common::fixed_now())));
        let record = nasdaq_record();
        let first = summarizer.summarize(&record).unwrap();
        let second = summarizer.summarize(&record).unwrap();
        assert_eq!(first, second);
        assert_eq!(summarizer.cache().unwrap().len(), 1);
    }

    #[test]
    fn summarizer_honours_disabled_cache() {
        let adapter = FileConfigAdapter::from_string("[summary]\ncache_enabled = false\n").unwrap();
        let summarizer = cli::build_summarizer(&adapter, Arc::new(ManualClock::new(common::fixed_now())));
        summarizer.summarize(&nasdaq_record()).unwrap();
        assert!(summarizer.cache().is_none());
    }
}
