use anyhow::Context;
use libmanager_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load LibManager settings")?;
    libmanager_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        "libmanager-app bootstrap starting"
    );

    libmanager_app::app::run(settings).await
}
