//! HTTP server facade for LibManager with Axum, error handling, and OpenAPI support.

use std::future::Future;

use anyhow::Context;
use axum::{routing::get, Router};

use libmanager_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use router::RouterBuilder;

/// Serve the registry's routes until `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(registry, settings);
    let address = format!("{}:{}", settings.server.host, settings.server.port);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new()
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .route("/healthz", get(health_check));

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    router_builder.with_openapi(registry).build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
