//! Logging for seeding runs.
//!
//! Events go to stderr as JSON (default) or pretty text, so stdout stays free
//! for the row counts the binary prints. `log::` records, including the SQL
//! echo from sqlx, are bridged into the same subscriber.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tracing::Span;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::Layer, layer::SubscriberExt};

use crate::config::AppConfig;

/// A single bulk INSERT echoes thousands of bind values, so sqlx statement
/// logging stays at `warn` unless `RUST_LOG` asks for it.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "sea_orm::driver=warn"];

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG` replaces the whole filter, including the quiet sqlx default.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!(
                "Warning: failed to bridge `log` records into tracing: {}. Connection and SQL logs will be missing.",
                err
            );
        }
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let fmt_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer()
            .pretty()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(err.into());
    }

    Ok(())
}

/// Root span for one invocation; every event of the run carries the
/// subcommand, profile and target schema.
pub fn run_span(config: &AppConfig, command: &'static str) -> Span {
    tracing::info_span!(
        "seed_run",
        command,
        profile = %config.profile,
        schema = %config.database.schema,
    )
}

fn default_directives(level: &str) -> String {
    std::iter::once(level)
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}
