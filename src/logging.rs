//! Logging initialization using the `tracing` ecosystem.
//!
//! The agent itself only emits `tracing` events. Hosts that have no
//! subscriber of their own can call [`init_logging`] once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{AgentError, Result};

/// Install the global subscriber.
///
/// - `log_level`: default filter when `RUST_LOG` is not set (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `file_prefix`: log file name prefix (e.g. the agent's magic or symbol)
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(log_level: &str, log_dir: Option<&str>, file_prefix: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let installed = if let Some(dir) = log_dir {
        let file_appender = tracing_appender::rolling::daily(dir, file_prefix);
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()
    };

    installed.map_err(|e| AgentError::Config(format!("logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        // Another test may already have installed a subscriber, so only the
        // second call's outcome is certain.
        let _ = init_logging("debug", None, "engulfing");
        assert!(matches!(
            init_logging("debug", None, "engulfing"),
            Err(AgentError::Config(_))
        ));
    }
}
