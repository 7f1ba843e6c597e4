//! Tracing initialisation for the action binary.
//!
//! Logs go to stderr; stdout carries the run summary and `::error::`
//! workflow commands.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Verbosity when `RUST_LOG` is unset: `debug` if the runner has step
/// debugging on (`RUNNER_DEBUG=1`), `info` otherwise.
pub fn default_level(runner_debug: Option<&str>) -> Level {
    match runner_debug {
        Some("1") => Level::DEBUG,
        _ => Level::INFO,
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Only the first call in a
/// process has an effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(Some("1")), Level::DEBUG);
        assert_eq!(default_level(Some("0")), Level::INFO);
        assert_eq!(default_level(None), Level::INFO);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
