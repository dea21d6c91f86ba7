use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};

/// Ordered collection of modules; lifecycle calls run in registration order
/// and shutdown runs in reverse.
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create an empty module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module. Names must be unique since they become route prefixes.
    pub fn register(&mut self, module: Arc<dyn Module>) -> anyhow::Result<()> {
        if self.get_module(module.name()).is_some() {
            anyhow::bail!("module '{}' is already registered", module.name());
        }

        tracing::debug!(module = module.name(), "module registered");
        self.modules.push(module);
        Ok(())
    }

    /// All registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initialize every module
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start every module
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl TestModule {
        fn record(&self, event: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            Ok(())
        }
    }

    struct FailingModule;

    #[async_trait::async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get_module("books").is_none());
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry
            .register(Arc::new(TestModule {
                name: "books",
                calls: calls.clone(),
            }))
            .unwrap();

        let err = registry
            .register(Arc::new(TestModule {
                name: "books",
                calls,
            }))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        for name in ["first", "second"] {
            registry
                .register(Arc::new(TestModule {
                    name,
                    calls: calls.clone(),
                }))
                .unwrap();
        }

        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "first:init",
                "second:init",
                "first:start",
                "second:start",
                "second:stop",
                "first:stop",
            ]
        );
    }

    #[tokio::test]
    async fn test_init_failure_names_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FailingModule)).unwrap();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        let err = registry.init_modules(&ctx).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to initialize module 'broken'"));
    }
}
