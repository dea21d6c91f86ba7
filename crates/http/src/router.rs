//! Router builder for the LibManager HTTP server

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, Uri},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{Timestamp, Uuid};

use libmanager_kernel::ModuleRegistry;

use crate::error::AppError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builder for constructing the main HTTP router.
///
/// Middleware toggles are recorded and applied in [`RouterBuilder::build`], so
/// they wrap every route regardless of the order the builder methods are called.
pub struct RouterBuilder {
    router: Router,
    tracing: bool,
    cors: bool,
    request_id: bool,
    timeout: Option<Duration>,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            tracing: false,
            cors: false,
            request_id: false,
            timeout: None,
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/api/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let api_path = format!("/api/{}", module_name);
        self.router = self.router.nest(&api_path, module_router);
        self
    }

    /// Trace every request and response
    pub fn with_tracing(mut self) -> Self {
        self.tracing = true;
        self
    }

    /// Allow cross-origin requests from anywhere
    pub fn with_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// Tag requests with a UUIDv7 `x-request-id` and echo it on the response
    pub fn with_request_id(mut self) -> Self {
        self.request_id = true;
        self
    }

    /// Fail requests that take longer than `timeout_ms` with 408
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(timeout_ms));
        self
    }

    /// Add OpenAPI documentation by collecting specs from all modules
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry);

        // Round-trip through utoipa so SwaggerUI can serve it.
        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "merged OpenAPI document is not valid, serving stub");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("LibManager API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            });

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        // Raw JSON for external consumers
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        let mut router = self.router.fallback(route_not_found);

        if let Some(timeout) = self.timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }

        let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

        if self.request_id {
            router = router.layer(PropagateRequestIdLayer::new(request_id_header.clone()));
        }

        if self.tracing {
            router = router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            );
        }

        if self.request_id {
            router = router.layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuidV7));
        }

        if self.cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge the base document with every module's fragment, prefixing module
/// paths with `/api/{module_name}`.
pub fn merged_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "LibManager API",
            "version": "1.0.0",
            "description": "Book catalog API"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "object",
                "properties": {
                    "code": { "type": "string" },
                    "message": { "type": "string" },
                    "details": { "type": "array", "items": { "type": "object" } },
                    "trace_id": { "type": "string" },
                    "timestamp": { "type": "string" }
                },
                "required": ["code", "message", "trace_id", "timestamp"]
            }
        },
        "required": ["error"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": { "schema": { "type": "string" } }
                    }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                // "/" maps to the bare module prefix
                let prefixed_path = match path.as_str() {
                    "/" => format!("/api/{}", module.name()),
                    _ => format!("/api/{}{}", module.name(), path),
                };
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

/// Request ID generator producing time-ordered UUIDs
#[derive(Clone)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct ShelfModule;

    #[async_trait::async_trait]
    impl libmanager_kernel::Module for ShelfModule {
        fn name(&self) -> &'static str {
            "shelves"
        }

        fn openapi(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!({
                "paths": {
                    "/": { "get": { "summary": "List shelves", "responses": {} } },
                    "/{id}": { "get": { "summary": "Get shelf", "responses": {} } }
                },
                "components": { "schemas": { "Shelf": { "type": "object" } } }
            }))
        }
    }

    async fn send(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_router_builder_basic() {
        let router = RouterBuilder::new()
            .route("/test", get(|| async { "test" }))
            .build();

        let response = send(router, "/test").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"test");
    }

    #[tokio::test]
    async fn test_module_mounting() {
        let module_router = Router::new().route("/", get(|| async { "module" }));

        let router = RouterBuilder::new()
            .mount_module("test", module_router)
            .build();

        assert_eq!(send(router, "/api/test").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() {
        let router = RouterBuilder::new().build();
        let response = send(router, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_middleware_chain_sets_request_id() {
        let router = RouterBuilder::new()
            .with_tracing()
            .with_cors()
            .with_request_id()
            .with_timeout(5000)
            .route("/health", get(|| async { "ok" }))
            .build();

        let response = send(router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("x-request-id header")
            .to_str()
            .unwrap();
        let parsed = Uuid::parse_str(request_id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_openapi_merges_module_fragments() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(ShelfModule)).unwrap();

        let spec = merged_openapi(&registry);
        assert!(spec["paths"]["/healthz"].is_object());
        assert_eq!(spec["paths"]["/api/shelves"]["get"]["summary"], "List shelves");
        assert_eq!(spec["paths"]["/api/shelves/{id}"]["get"]["summary"], "Get shelf");
        assert!(spec["components"]["schemas"]["Shelf"].is_object());
        assert!(spec["components"]["schemas"]["ErrorResponse"].is_object());
    }
}
