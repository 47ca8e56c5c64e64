//! Process-wide logging setup for the admin console and its tests.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Install the default subscriber: JSON lines, filtered by `RUST_LOG`
/// (default `info`), format overridable through `PAYDESK_LOG_FORMAT`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    let format = std::env::var(tracing::LOG_FORMAT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default();
    tracing::init(format);
}
