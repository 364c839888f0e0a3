//! Global subscriber installation, kept in its own binary so the installed
//! subscriber does not leak into other tests.

use zdao_sync::config::LoggingConfig;
use zdao_sync::logging;

#[test]
fn test_init_is_idempotent() {
    let config = LoggingConfig {
        level: "info".to_string(),
    };
    assert!(logging::init(&config));
    assert!(!logging::init(&config));
}
