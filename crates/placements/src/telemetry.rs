use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{value}'")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("unable to install tracing subscriber: {0}")]
    Init(Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global tracing subscriber. `RUST_LOG` wins when set; otherwise
/// the configured level applies to this service with the HTTP internals kept
/// at `warn` so reconciler and fan-out logs stay readable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let value = default_directives(config);
            EnvFilter::try_new(&value)
                .map_err(|source| TelemetryError::Filter { value, source })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(TelemetryError::Init)
}

fn default_directives(config: &TelemetryConfig) -> String {
    format!("{},hyper=warn,tower=warn", config.log_level)
}
