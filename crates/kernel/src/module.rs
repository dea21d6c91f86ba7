use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Lifecycle contract for a LibManager feature module: `init` and `start` run
/// in registration order at startup, `stop` in reverse at shutdown
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Prepare the module's state before any routes are served.
    /// The books module seeds the demo catalog here when
    /// `catalog.seed_sample_data` is set and the catalog is empty.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/api/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment for this module; its paths are prefixed with
    /// `/api/{module_name}` when merged into the served document
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background work for this module
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, in reverse registration order, after the
    /// server has drained. Modules that own a store log their final state here.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
