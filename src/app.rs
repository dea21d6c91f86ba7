//! Application bootstrap shared by the `libmanager-app` and `libmanager` binaries.

use anyhow::Context;
use axum::Router;
use libmanager_kernel::settings::{CatalogSettings, Settings};
use libmanager_kernel::{InitCtx, ModuleRegistry};

use crate::modules;
use crate::modules::books::store::BookStore;

/// Open the catalog described by `settings`.
pub fn open_store(settings: &CatalogSettings) -> anyhow::Result<BookStore> {
    match &settings.snapshot_path {
        Some(path) => BookStore::open(path)
            .with_context(|| format!("failed to open catalog at {}", path.display())),
        None => Ok(BookStore::in_memory()),
    }
}

/// Registry with every application module registered against `store`.
pub fn build_registry(store: BookStore) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store)?;
    Ok(registry)
}

/// Initialize modules and return the fully layered router without binding a
/// socket.
pub async fn build_app(settings: &Settings, store: BookStore) -> anyhow::Result<Router> {
    let registry = build_registry(store)?;
    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;
    Ok(libmanager_http::build_router(&registry, settings))
}

/// Run the service until Ctrl-C or SIGTERM.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = open_store(&settings.catalog)?;
    let registry = build_registry(store)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = libmanager_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
