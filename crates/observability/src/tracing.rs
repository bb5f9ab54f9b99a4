//! Tracing/logging initialization.
//!
//! - Filter: `RUST_LOG`, falling back to `LogConfig::default_directive`
//! - Format: `VARIANTFORGE_LOG_FORMAT=json|pretty` (JSON by default)
//! - Output: stderr, so stdout stays free for command output

use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "VARIANTFORGE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset or invalid.
    pub default_directive: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_directive: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            format: std::env::var(ENV_LOG_FORMAT)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match config.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_falls_back_to_json() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(" TEXT "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Json);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init(LogConfig::default());
        init(LogConfig {
            format: LogFormat::Pretty,
            default_directive: "debug".to_string(),
        });
        ::tracing::info!("still logging");
    }
}
