pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

use async_trait::async_trait;
use axum::Router;
use libmanager_kernel::{InitCtx, Module};
use serde_json::json;

use models::{BookPatch, NewBook};
use store::BookStore;

/// Demo catalog loaded when `catalog.seed_sample_data` is enabled.
pub fn sample_books() -> Vec<NewBook> {
    vec![
        NewBook::new("The Great Gatsby", "F. Scott Fitzgerald").with_isbn("9780743273565"),
        NewBook::new("Clean Code", "Robert C. Martin").with_isbn("9780132350884"),
        NewBook::new("1984", "George Orwell").with_isbn("9780451524935"),
        NewBook::new("Design Patterns", "Erich Gamma").with_isbn("9780201633610"),
    ]
}

/// Demo titles that start out checked out.
const SAMPLE_ISSUED: &[&str] = &["Clean Code"];

/// Book catalog module: CRUD over an injected [`BookStore`]
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.catalog.seed_sample_data && self.store.is_empty() {
            let seeded = self.store.seed(sample_books())?;
            for book in seeded
                .iter()
                .filter(|book| SAMPLE_ISSUED.contains(&book.title.as_str()))
            {
                self.store.update(book.id, BookPatch::issued(true))?;
            }
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = self.store.len(),
            persistent = self.store.snapshot_path().is_some(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            books = self.store.len(),
            "books module stopped"
        );
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64", "minimum": 1 }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "All books in creation order",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("CreateBook"),
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Malformed request body"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "patch": {
                    "summary": "Update fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": json_body("UpdateBook"),
                    "responses": {
                        "200": book_response("Updated book"),
                        "404": error_response("Book not found"),
                        "422": error_response("Validation error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "204": { "description": "Book deleted" },
                        "404": error_response("Book not found")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64", "description": "Unique identifier for the book" },
                        "title": { "type": "string", "maxLength": 200, "description": "Title of the book" },
                        "author": { "type": "string", "maxLength": 200, "description": "Author of the book" },
                        "isbn": { "type": ["string", "null"], "maxLength": 13, "description": "ISBN, if known" },
                        "is_issued": { "type": "boolean", "description": "Whether the book is checked out" },
                        "created_at": { "type": "string", "format": "date-time", "description": "When the book was added" }
                    },
                    "required": ["id", "title", "author", "isbn", "is_issued", "created_at"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "isbn": { "type": ["string", "null"], "maxLength": 13 }
                    },
                    "required": ["title", "author"]
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "author": { "type": "string", "minLength": 1, "maxLength": 200 },
                        "isbn": { "type": ["string", "null"], "maxLength": 13 },
                        "is_issued": { "type": "boolean" }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module backed by `store`
pub fn create_module(store: BookStore) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libmanager_kernel::Settings;

    #[tokio::test]
    async fn init_seeds_empty_catalog_when_enabled() {
        let mut settings = Settings::default();
        settings.catalog.seed_sample_data = true;
        let ctx = InitCtx {
            settings: &settings,
        };

        let module = BooksModule::new(BookStore::in_memory());
        module.init(&ctx).await.unwrap();
        assert_eq!(module.store().len(), 4);

        let issued: Vec<_> = module
            .store()
            .list()
            .into_iter()
            .filter(|book| book.is_issued)
            .map(|book| book.title)
            .collect();
        assert_eq!(issued, vec!["Clean Code"]);

        // A second init does not duplicate the demo books.
        module.init(&ctx).await.unwrap();
        assert_eq!(module.store().len(), 4);
    }

    #[tokio::test]
    async fn init_leaves_catalog_alone_by_default() {
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        let module = BooksModule::new(BookStore::in_memory());
        module.init(&ctx).await.unwrap();
        assert!(module.store().is_empty());
    }

    #[test]
    fn sample_books_are_valid() {
        let store = BookStore::in_memory();
        let seeded = store.seed(sample_books()).unwrap();
        assert_eq!(seeded[2].title, "1984");
        assert!(seeded.iter().all(|book| !book.is_issued));
    }

    #[test]
    fn openapi_fragment_covers_every_route() {
        let spec = BooksModule::new(BookStore::in_memory()).openapi().unwrap();
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths["/"]["get"].is_object());
        assert!(paths["/"]["post"].is_object());
        for method in ["get", "patch", "delete"] {
            assert!(paths["/{id}"][method].is_object(), "missing {method}");
        }
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}
