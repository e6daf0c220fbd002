//! Tracing setup: subscriber initialisation, span macros and event helpers.

pub mod events;
pub mod spans;

use std::sync::Once;

use noesis_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "NOESIS_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `NOESIS_LOG` wins over `config.log_level`. Output is JSON when
/// `config.json_logs` is set. Only the first call has any effect, and a
/// subscriber installed elsewhere is left in place.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true);
        let installed = if config.json_logs {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already set, keeping it");
        }
    });
}
