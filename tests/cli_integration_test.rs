//! CLI orchestration tests with real INI, SQLite and CSV files on disk.
//!
//! Tests cover:
//! - Logging settings and symbol resolution
//! - Bar source selection from `[source] kind`
//! - `recompute` against a seeded SQLite file
//! - `signals` against SQLite and CSV sources

mod common;

use common::*;
use kline_signals::adapters::file_config_adapter::FileConfigAdapter;
use kline_signals::cli;
use kline_signals::domain::bar::{Bar, Period};
use kline_signals::domain::engine::IndicatorEngine;
use kline_signals::domain::error::KlineError;
use kline_signals::logging::LogFormat;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sqlite_ini(db_path: &Path, extra: &str) -> String {
    format!(
        "[sqlite]\npath = {}\npool_size = 2\n\n[batch]\nworkers = 2\n{extra}\n",
        db_path.display()
    )
}

fn write_csv(dir: &Path, symbol: &str, period: Period, bars: &[Bar]) {
    let mut content = String::from("trade_date,open,high,low,close,volume,amount\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.trade_date, b.open, b.high, b.low, b.close, b.volume, b.amount
        ));
    }
    std::fs::write(dir.join(format!("{symbol}_{period}.csv")), content).unwrap();
}

mod settings {
    use super::*;

    #[test]
    fn logging_defaults_to_pretty_info() {
        let config = FileConfigAdapter::from_string("").unwrap();
        let (format, filter) = cli::logging_settings(&config).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(filter, "info");
    }

    #[test]
    fn logging_reads_format_and_filter() {
        let config =
            FileConfigAdapter::from_string("[logging]\nformat = json\nfilter = kline_signals=debug\n")
                .unwrap();
        let (format, filter) = cli::logging_settings(&config).unwrap();
        assert_eq!(format, LogFormat::Json);
        assert_eq!(filter, "kline_signals=debug");
    }

    #[test]
    fn unknown_logging_format_is_invalid() {
        let config = FileConfigAdapter::from_string("[logging]\nformat = xml\n").unwrap();
        assert!(matches!(
            cli::logging_settings(&config),
            Err(KlineError::ConfigInvalid { key, .. }) if key == "format"
        ));
    }

    #[test]
    fn command_line_symbols_win() {
        let config = FileConfigAdapter::from_string("[batch]\nsymbols = AAA,BBB\n").unwrap();
        let port = MockBarPort::new().with_bars("CCC", wave_bars(5));
        let symbols =
            cli::resolve_symbols(&["zzz".to_string()], &config, &port, Period::Day).unwrap();
        assert_eq!(symbols, vec!["ZZZ"]);
    }

    #[test]
    fn configured_symbols_come_next() {
        let config = FileConfigAdapter::from_string("[batch]\nsymbols = AAA,BBB\n").unwrap();
        let port = MockBarPort::new().with_bars("CCC", wave_bars(5));
        let symbols = cli::resolve_symbols(&[], &config, &port, Period::Day).unwrap();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
    }

    #[test]
    fn bar_source_symbols_are_the_fallback() {
        let config = FileConfigAdapter::from_string("").unwrap();
        let port = MockBarPort::new()
            .with_bars("CCC", wave_bars(5))
            .with_bars("AAA", wave_bars(5));
        let symbols = cli::resolve_symbols(&[], &config, &port, Period::Day).unwrap();
        assert_eq!(symbols, vec!["AAA", "CCC"]);
    }

    #[test]
    fn csv_source_requires_dir() {
        let config = FileConfigAdapter::from_string("[source]\nkind = csv\n").unwrap();
        assert!(matches!(
            cli::open_bar_source(&config),
            Err(KlineError::ConfigMissing { key, .. }) if key == "dir"
        ));
    }

    #[test]
    fn unknown_source_kind_is_invalid() {
        let config = FileConfigAdapter::from_string("[source]\nkind = parquet\n").unwrap();
        assert!(matches!(
            cli::open_bar_source(&config),
            Err(KlineError::ConfigInvalid { key, .. }) if key == "kind"
        ));
    }

    #[test]
    fn missing_config_file_is_a_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/kline.ini")).err().unwrap();
        assert!(matches!(err, KlineError::ConfigParse { .. }));
    }
}

mod signals {
    use super::*;
    use kline_signals::domain::signal::{SignalCategory, SignalEvent};

    #[test]
    fn format_signal_prints_date_category_side() {
        let event = SignalEvent {
            trade_date: 20240105,
            category: SignalCategory::Buy { tier: 6 },
        };
        assert_eq!(cli::format_signal(&event), "20240105 buy(6) buy");

        let event = SignalEvent {
            trade_date: 20240108,
            category: SignalCategory::PrepareSell,
        };
        assert_eq!(cli::format_signal(&event), "20240108 prepare-sell watch");
    }

    #[test]
    fn signals_from_csv_match_engine() {
        let dir = TempDir::new().unwrap();
        let bars = wave_bars(120);
        write_csv(dir.path(), "SH600000", Period::Week, &bars);
        let ini = format!(
            "[source]\nkind = csv\n\n[csv]\ndir = {}\n",
            dir.path().display()
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();

        let events = cli::run_signals(&config, "sh600000", Some("week")).unwrap();

        let expected = IndicatorEngine::default()
            .compute(&bars, Period::Week)
            .unwrap()
            .signals();
        assert!(!events.is_empty());
        assert_eq!(events, expected);
    }

    #[test]
    fn signals_reject_unknown_period() {
        let config = FileConfigAdapter::from_string("").unwrap();
        assert!(matches!(
            cli::run_signals(&config, "AAA", Some("hour")),
            Err(KlineError::ConfigInvalid { key, .. }) if key == "period"
        ));
    }

    #[test]
    fn signals_for_unknown_symbol_is_no_data() {
        let dir = TempDir::new().unwrap();
        let ini = format!(
            "[source]\nkind = csv\n\n[csv]\ndir = {}\n",
            dir.path().display()
        );
        write_csv(dir.path(), "AAA", Period::Day, &[]);
        let config = FileConfigAdapter::from_string(&ini).unwrap();
        assert!(matches!(
            cli::run_signals(&config, "AAA", None),
            Err(KlineError::NoData { .. })
        ));
    }
}

#[cfg(feature = "sqlite")]
mod recompute {
    use super::*;
    use kline_signals::adapters::sqlite_adapter::SqliteAdapter;
    use kline_signals::domain::batch::SymbolStatus;
    use kline_signals::domain::incremental::RecomputeMode;

    fn seeded_db(dir: &TempDir) -> (std::path::PathBuf, Vec<Bar>) {
        let db_path = dir.path().join("bars.db");
        let config = FileConfigAdapter::from_string(&sqlite_ini(&db_path, "")).unwrap();
        let adapter = SqliteAdapter::from_config(&config).unwrap();
        let history = wave_bars(90);
        adapter.insert_bars("SH600000", Period::Day, &history).unwrap();
        adapter
            .insert_bars("SZ000001", Period::Day, &rising_bars(60))
            .unwrap();
        adapter
            .insert_bars("SH600000", Period::Week, &wave_bars(20))
            .unwrap();
        (db_path, history)
    }

    #[test]
    fn recompute_updates_every_listed_symbol() {
        let dir = TempDir::new().unwrap();
        let (db_path, history) = seeded_db(&dir);
        let file = write_temp_ini(&sqlite_ini(&db_path, ""));
        let config = cli::load_config(file.path()).unwrap();

        let report = cli::run_recompute(&config, &[]).unwrap();
        assert_eq!(report.updated(), 2);
        assert_eq!(report.failed(), 0);

        let adapter = SqliteAdapter::from_config(&config).unwrap();
        assert_eq!(
            adapter.all_indicator_rows("SH600000", Period::Day).unwrap(),
            IndicatorEngine::default()
                .compute(&history, Period::Day)
                .unwrap()
                .rows
        );
        assert!(
            adapter
                .all_indicator_rows("SH600000", Period::Week)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn recompute_respects_symbol_filter_and_resumes() {
        let dir = TempDir::new().unwrap();
        let (db_path, _) = seeded_db(&dir);
        let config =
            FileConfigAdapter::from_string(&sqlite_ini(&db_path, "symbols = SZ000001")).unwrap();

        let first = cli::run_recompute(&config, &[]).unwrap();
        assert_eq!(first.outcomes.len(), 1);
        assert!(matches!(
            first.outcome("SZ000001"),
            Some(SymbolStatus::Updated {
                rows: 60,
                mode: RecomputeMode::Full
            })
        ));

        let second = cli::run_recompute(&config, &["sz000001".to_string()]).unwrap();
        assert!(matches!(
            second.outcome("SZ000001"),
            Some(SymbolStatus::Updated {
                rows: 1,
                mode: RecomputeMode::Resumed { .. }
            })
        ));
    }

    #[test]
    fn recompute_with_invalid_engine_config_fails_early() {
        let dir = TempDir::new().unwrap();
        let (db_path, _) = seeded_db(&dir);
        let ini = format!(
            "{}\n[engine]\nmacd_fast = 30\n",
            sqlite_ini(&db_path, "")
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();
        assert!(matches!(
            cli::run_recompute(&config, &[]),
            Err(KlineError::ConfigInvalid { key, .. }) if key == "macd_fast"
        ));
    }

    #[test]
    fn signals_read_from_sqlite() {
        let dir = TempDir::new().unwrap();
        let (db_path, history) = seeded_db(&dir);
        let config = FileConfigAdapter::from_string(&sqlite_ini(&db_path, "")).unwrap();

        let events = cli::run_signals(&config, "SH600000", None).unwrap();
        assert_eq!(
            events,
            IndicatorEngine::default()
                .compute(&history, Period::Day)
                .unwrap()
                .signals()
        );
    }
}
