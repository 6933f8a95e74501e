//! This module provides observability and diagnostics for the codec.
//!
//! The segment planner and compressor make data-dependent decisions (segment
//! boundaries, bit widths, constant collapse). The `log_metric!` macro makes
//! those decisions visible as structured key-value records on the `log` facade,
//! and `enable_verbose_logging` installs an `env_logger` backend for hosts that
//! don't bring their own.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use crate::error::CurveCodecError;

/// Logs a structured key-value metric string at debug level.
///
/// The formatting work is skipped entirely when debug logging is disabled.
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("CURVEPACK_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs a process-wide `env_logger` at `Info` level (`Debug` when
/// `verbose` is set). Only the first call has any effect.
///
/// When `log_file` is given, records are appended to that file instead of stderr.
pub fn enable_verbose_logging(log_file: Option<&Path>, verbose: bool) -> Result<(), CurveCodecError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
