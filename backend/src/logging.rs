//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::EnvironmentMode;

/// Install the global subscriber. JSON lines when deployed, compact text
/// against the emulators. Filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(mode: EnvironmentMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        EnvironmentMode::Production => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        EnvironmentMode::Emulator => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init(),
    }
}
