//! Structured logging for the starfish binary.
//!
//! Everything is written to `stderr`, leaving `stdout` for the registration
//! summary. `RUST_LOG` sets the level (default `info`) and
//! `STARFISH_LOG_FORMAT` picks between human-readable and JSON lines.

use std::{env, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "STARFISH_LOG_FORMAT";

static INSTALLED: OnceLock<LogFormat> = OnceLock::new();

/// Output format of the installed subscriber.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per event, including the active span list.
    Json,
}

impl LogFormat {
    /// Resolves the format from the raw value of [`LOG_FORMAT_ENV`].
    fn from_env_value(value: Result<String, env::VarError>) -> Result<Self, LoggingError> {
        match value {
            Ok(raw) => raw.parse(),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(source @ env::VarError::NotUnicode(_)) => Err(LoggingError::InvalidUnicode {
                name: LOG_FORMAT_ENV,
                source,
            }),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = raw.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::UnsupportedFormat {
                provided: normalised,
            }),
        }
    }
}

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// `STARFISH_LOG_FORMAT` was not valid UTF-8.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying lookup failure.
        #[source]
        source: env::VarError,
    },
    /// `STARFISH_LOG_FORMAT` named an unknown format.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Normalised value supplied by the user.
        provided: String,
    },
}

/// Installs the global subscriber and returns the format in use.
///
/// Later calls return the first call's format without reinstalling. A
/// subscriber installed by someone else is left in place.
///
/// # Errors
/// Returns [`LoggingError`] when `STARFISH_LOG_FORMAT` is unreadable or
/// unsupported.
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(format) = INSTALLED.get() {
        return Ok(*format);
    }
    let format = LogFormat::from_env_value(env::var(LOG_FORMAT_ENV))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let fmt_layer = match format {
        LogFormat::Json => fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Human => fmt_layer.boxed(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = LogTracer::init();
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
    {
        tracing::debug!(error = %err, "keeping the existing tracing subscriber");
    }
    Ok(*INSTALLED.get_or_init(|| format))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::absent(Err(env::VarError::NotPresent), LogFormat::Human)]
    #[case::human(Ok("human".to_owned()), LogFormat::Human)]
    #[case::text_alias(Ok("Text".to_owned()), LogFormat::Human)]
    #[case::padded_json(Ok("  JSON\n".to_owned()), LogFormat::Json)]
    fn env_values_select_a_format(
        #[case] value: Result<String, env::VarError>,
        #[case] expected: LogFormat,
    ) {
        let format = LogFormat::from_env_value(value).expect("value is supported");
        assert_eq!(format, expected);
    }

    #[rstest]
    fn unknown_formats_report_the_normalised_value() {
        let err = " XML ".parse::<LogFormat>().expect_err("xml is not a log format");
        assert!(matches!(
            err,
            LoggingError::UnsupportedFormat { ref provided } if provided == "xml"
        ));
        assert!(err.to_string().contains("`human` or `json`"));
    }

    #[cfg(unix)]
    #[rstest]
    fn non_unicode_values_name_the_variable() {
        use std::{ffi::OsString, os::unix::ffi::OsStringExt};

        let raw = OsString::from_vec(vec![0x6a, 0xff]);
        let err = LogFormat::from_env_value(Err(env::VarError::NotUnicode(raw)))
            .expect_err("invalid utf-8 is rejected");
        assert!(err.to_string().contains(LOG_FORMAT_ENV));
    }

    #[rstest]
    fn repeated_initialisation_reports_the_first_format() {
        let first = init_logging().expect("logging installs");
        assert_eq!(init_logging().expect("second call is a no-op"), first);
    }
}
