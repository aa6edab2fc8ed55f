//! Tracing subscriber initialization with structured logging.
//!
//! Stdout carries the MCP protocol, so every log line goes to stderr.
//!
//! # Usage
//!
//! ```no_run
//! use lancedb_mcp_types::config::LogFormat;
//!
//! lancedb_mcp_observe::tracing_setup::init_tracing("info", LogFormat::Text).unwrap();
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use lancedb_mcp_types::config::LogFormat;

/// Initialize the global tracing subscriber.
///
/// - Installs a `fmt` layer writing to stderr, as plain text or one JSON
///   object per line.
/// - `RUST_LOG`, when set, takes precedence over `log_level`.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter directive or the
/// global subscriber has already been set.
pub fn init_tracing(
    log_level: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = build_filter(log_level)?;

    match format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

/// `RUST_LOG` if set, otherwise `log_level`.
fn build_filter(log_level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(normalize_level(log_level)),
    }
}

/// Accept level names in any case (`INFO`, `Debug`) as well as full directives.
fn normalize_level(log_level: &str) -> String {
    let trimmed = log_level.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        level @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => level.to_string(),
        "warning" => "warn".to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO"), "info");
        assert_eq!(normalize_level(" Debug "), "debug");
        assert_eq!(normalize_level("WARNING"), "warn");
        assert_eq!(
            normalize_level("lancedb_mcp_infra=debug,info"),
            "lancedb_mcp_infra=debug,info"
        );
    }

    #[test]
    fn test_normalized_levels_parse() {
        for level in ["TRACE", "debug", "Info", "warning", "error", "lancedb=debug"] {
            assert!(EnvFilter::try_new(normalize_level(level)).is_ok(), "{level}");
        }
    }
}
