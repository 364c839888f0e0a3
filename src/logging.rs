//! Tracing subscriber setup for host applications.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(from_env.as_deref(), config)
}

fn filter_from(directives: Option<&str>, config: &LoggingConfig) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.level))
}

/// Install a global fmt subscriber.
///
/// Returns false when a subscriber was already installed (e.g. by the host
/// or by another test), which is not an error.
pub fn init(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn level(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
        }
    }

    #[test]
    fn test_configured_level_without_env() {
        let filter = filter_from(None, &level("debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_env_directives_win() {
        let filter = filter_from(Some("warn"), &level("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
