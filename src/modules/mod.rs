pub mod books;

use libmanager_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: BookStore) -> anyhow::Result<()> {
    registry.register(books::create_module(store))
}
