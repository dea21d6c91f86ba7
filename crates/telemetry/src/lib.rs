//! Logging bootstrap for LibManager binaries.

use anyhow::Context;
use libmanager_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Logs go to stderr. `RUST_LOG` takes precedence over `settings.level`.
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().flatten_event(true).try_init().is_ok(),
    };

    if installed {
        tracing::debug!(
            target: "libmanager-telemetry",
            format = ?settings.log_format,
            "tracing initialized"
        );
    }

    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("invalid log level directive '{}'", settings.level)),
    }
}
