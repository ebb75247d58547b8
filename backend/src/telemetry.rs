//! Tracing subscriber setup shared by the binaries.

use mockable::Env;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl LogFormat {
    /// `json` (any case) selects JSON; everything else is plain text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Plain
        }
    }
}

/// Translate a `LOG_LEVEL` value into an `EnvFilter` directive.
pub fn level_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_owned(),
        "critical" | "fatal" => "error".to_owned(),
        "" => "info".to_owned(),
        other => other.to_owned(),
    }
}

/// Install the global subscriber.
///
/// Runs before settings are loaded so their warnings are captured; it reads
/// `LOG_LEVEL` (default `INFO`) and `LOG_FORMAT` (default `json`) itself.
/// `RUST_LOG` wins over `LOG_LEVEL` when set. Initialisation failure (a
/// subscriber already installed) is logged and otherwise ignored.
pub fn init_tracing<E: Env>(env: &E) {
    let level = env.string("LOG_LEVEL").unwrap_or_else(|| "INFO".to_owned());
    let format = env.string("LOG_FORMAT").unwrap_or_else(|| "json".to_owned());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&level)));
    let result = match LogFormat::parse(&format) {
        LogFormat::Json => fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Plain => fmt().with_env_filter(filter).try_init(),
    };
    if let Err(error) = result {
        warn!(%error, "tracing init failed");
    }
}
