//! Tracing subscriber setup
//!
//! Every generation attempt runs inside a `generation` span (attempt,
//! category, provider, model) and every render inside a `render` span
//! (ticket, backend, theme). API keys never appear in fields.
//!
//! Output goes to stderr so rendered documents written to stdout stay clean.
//!
//! ```rust
//! use umlcraft::core::logging::init_logging;
//!
//! let _ = init_logging(Some("umlcraft=debug"), Some("json"));
//! ```
//!
//! Unset arguments fall back to `UMLCRAFT_LOG_LEVEL` (then `RUST_LOG`) and
//! `UMLCRAFT_LOG_FORMAT`, then to `info` and `compact`.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

const LEVEL_VAR: &str = "UMLCRAFT_LOG_LEVEL";
const FORMAT_VAR: &str = "UMLCRAFT_LOG_FORMAT";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line with source locations and span close timings
    Pretty,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Unknown log format: {} (expected one of {:?})",
                s,
                Self::variants()
            )),
        }
    }
}

/// Resolved filter directive and format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Combine explicit values with the environment
    ///
    /// An unparseable directive degrades to `info`; an unknown format is an
    /// error.
    pub fn resolve(level: Option<&str>, format: Option<&str>) -> Result<Self, String> {
        let directive = level
            .map(str::to_string)
            .or_else(|| std::env::var(LEVEL_VAR).ok())
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|d| EnvFilter::try_new(d).is_ok())
            .unwrap_or_else(|| "info".to_string());

        let format = match format
            .map(str::to_string)
            .or_else(|| std::env::var(FORMAT_VAR).ok())
        {
            Some(name) => name.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self { directive, format })
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        match self.format {
            LogFormat::Compact => base
                .with_target(false)
                .with_span_events(FmtSpan::NONE)
                .compact()
                .boxed(),
            LogFormat::Pretty => base
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .pretty()
                .boxed(),
            LogFormat::Json => base.with_span_events(FmtSpan::CLOSE).json().boxed(),
        }
    }

    /// Install the global subscriber
    pub fn install(&self) -> Result<(), Box<dyn std::error::Error>> {
        Registry::default()
            .with(self.layer())
            .with(EnvFilter::try_new(&self.directive)?)
            .try_init()?;
        Ok(())
    }
}

/// Initialize the global subscriber
///
/// Fails for an unknown format or when a subscriber is already installed.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    LogSettings::resolve(level, format)?.install()
}

pub fn init_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None, None)
}
