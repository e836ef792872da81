//! Logging setup for the test suite
//!
//! Installs a global tracing subscriber once per process and silences the
//! HTTP stack used by hf-hub, which otherwise floods test output with
//! connection-pool chatter during model downloads.

use tracing_subscriber::EnvFilter;

/// Targets that log per-request noise during model downloads.
const SILENCED_TARGETS: &[&str] = &["ureq", "hf_hub", "rustls"];

/// Initialize logging for tests.
///
/// Sets the global level to INFO with timestamp, source file, level, and
/// message in each line. Safe to call from every test: once a subscriber is
/// installed, subsequent calls are no-ops.
pub fn init_test_logging() {
    let mut directives = String::from("info");
    for target in SILENCED_TARGETS {
        directives.push_str(&format!(",{target}=off"));
    }

    // try_init fails if a subscriber is already set; that is the expected
    // outcome on every call after the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_file(true)
        .with_line_number(false)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        init_test_logging();
    }
}
