use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("'{directive}' is not a valid log filter")]
    Filter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("a log subscriber is already installed")]
    AlreadyInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Picks the log filter: a usable `RUST_LOG` first, then the `--log-level`
/// directive.
fn filter_for(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level).map_err(|source| TelemetryError::Filter {
        directive: log_level.to_string(),
        source,
    })
}

/// Sends library events to stderr so stdout stays machine readable.
pub fn init(log_level: &str) -> Result<(), TelemetryError> {
    let filter = filter_for(log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}
