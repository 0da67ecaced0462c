//! One-shot scheduler tick entry point.
//!
//! # Responsibility
//! - Run exactly one scheduling pass and exit; an external trigger (cron,
//!   a systemd timer) provides the once-per-minute cadence.
//! - Wire storage, ledger and audio dispatch together from environment
//!   configuration.
//!
//! # Invariants
//! - Routine outcomes (nothing scheduled, duplicates, store hiccups) exit
//!   with status 0 so the trigger does not treat them as failures.
//! - Concurrent invocations are safe; the firing ledger serializes claims.

use chime_core::db::open_db;
use chime_core::{
    default_log_level, init_logging, FileFiringLedger, PlayerCommandDispatch, SchedulerEngine,
    TickReport,
};
use log::error;
use std::path::PathBuf;

const ENV_DB: &str = "CHIME_DB";
const ENV_SOUND_DIR: &str = "CHIME_SOUND_DIR";
const ENV_LEDGER_DIR: &str = "CHIME_LEDGER_DIR";
const ENV_LOG_DIR: &str = "CHIME_LOG_DIR";
const ENV_LOG_LEVEL: &str = "CHIME_LOG_LEVEL";

struct TickConfig {
    db_path: PathBuf,
    sound_dir: PathBuf,
    ledger_dir: PathBuf,
    log_dir: PathBuf,
    log_level: String,
}

impl TickConfig {
    fn from_env() -> Self {
        Self {
            db_path: env_path(ENV_DB, || PathBuf::from("chime.db")),
            sound_dir: env_path(ENV_SOUND_DIR, || PathBuf::from("sounds")),
            ledger_dir: env_path(ENV_LEDGER_DIR, || {
                std::env::temp_dir().join("chime").join("ledger")
            }),
            log_dir: env_path(ENV_LOG_DIR, || {
                std::env::temp_dir().join("chime").join("logs")
            }),
            log_level: std::env::var(ENV_LOG_LEVEL)
                .unwrap_or_else(|_| default_log_level().to_string()),
        }
    }
}

fn env_path(key: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match std::env::var_os(key) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => default(),
    }
}

fn main() {
    let config = TickConfig::from_env();

    // A broken log sink must not silence the bells; report and carry on.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("chime-tick: file logging unavailable: {err}");
    }

    let mut conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=tick_bootstrap module=cli status=error db={} error={}",
                config.db_path.display(),
                err
            );
            eprintln!(
                "chime-tick: cannot open bell database `{}`: {err}",
                config.db_path.display()
            );
            std::process::exit(1);
        }
    };

    let engine = SchedulerEngine::new(
        FileFiringLedger::new(&config.ledger_dir),
        PlayerCommandDispatch,
        &config.sound_dir,
    );
    let report = engine.run_tick(&mut conn);

    println!("{}", summarize(&report));
}

fn summarize(report: &TickReport) -> String {
    format!(
        "chime-tick slot={} candidates={} fired={} dispatch_failed={} skipped_day={} duplicates={} ledger_failed={}{}",
        report.minute_slot,
        report.candidates,
        report.fired.len(),
        report.dispatch_failed.len(),
        report.skipped_day.len(),
        report.skipped_duplicate.len(),
        report.ledger_failed.len(),
        if report.store_error { " store_error=1" } else { "" }
    )
}
