//! Logging initialization.
//!
//! Thin wrapper over the observability crate so binaries get the workspace's
//! JSONL log stream with one call.

use crate::Paths;

/// Initializes logging for a notes binary.
///
/// - Structured JSONL to `~/.notes/logs/dev.jsonl` (see [`Paths::log_file`])
/// - Level from `RUST_LOG`, otherwise `level`
/// - Compact stderr output as well when `level` asks for debug or trace
///
/// ```ignore
/// init_logging("notes-cli", "info", &Paths::new()?);
/// tracing::info!("started");
/// ```
pub fn init_logging(service_name: &str, level: &str, paths: &Paths) {
    let verbose = parse_level(level) >= tracing::Level::DEBUG;

    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: verbose,
    });
}

/// Parse a log level string into a tracing Level. Unknown strings mean INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), tracing::Level::TRACE);
        assert_eq!(parse_level(" Debug "), tracing::Level::DEBUG);
        assert_eq!(parse_level("WARNING"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn verbosity_ordering() {
        // tracing orders levels by verbosity: TRACE is the greatest.
        assert!(parse_level("trace") >= tracing::Level::DEBUG);
        assert!(parse_level("info") < tracing::Level::DEBUG);
    }
}
