//! Registry of HTTP functions served by this process.
//!
//! Every function registered here inherits the backend's global options and
//! is wrapped in its CORS layer.

use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::bootstrap::Backend;
use crate::options::GlobalOptions;
use crate::{Error, Result};

/// Path the deployment manifest is served on.
pub const MANIFEST_PATH: &str = "/__/functions.json";

/// Deployment entry for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionManifest {
    pub name: String,
    #[serde(flatten)]
    pub options: GlobalOptions,
}

pub struct Functions {
    backend: Backend,
    routes: Vec<(String, MethodRouter<Backend>)>,
}

impl Functions {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            routes: Vec::new(),
        }
    }

    /// Register a function, mounted at `/{name}`.
    pub fn register(mut self, name: &str, route: MethodRouter<Backend>) -> Result<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Config(format!("Invalid function name: {:?}", name)));
        }
        if self.routes.iter().any(|(existing, _)| existing == name) {
            return Err(Error::Config(format!("Function {} registered twice", name)));
        }

        let options = self.backend.options();
        info!(
            function = name,
            region = %options.region,
            max_instances = options.max_instances,
            "Registered function"
        );
        self.routes.push((name.to_string(), route));
        Ok(self)
    }

    pub fn manifest(&self) -> Vec<FunctionManifest> {
        self.routes
            .iter()
            .map(|(name, _)| FunctionManifest {
                name: name.clone(),
                options: self.backend.options().clone(),
            })
            .collect()
    }

    /// Build the router: every function plus the manifest, behind CORS.
    pub fn into_router(self) -> Router {
        let manifest = self.manifest();
        let cors = self.backend.cors().clone();

        let router = self
            .routes
            .into_iter()
            .fold(Router::new(), |router, (name, route)| {
                router.route(&format!("/{}", name), route)
            });

        router
            .route(
                MANIFEST_PATH,
                get(move || {
                    let manifest = manifest.clone();
                    async move { Json(manifest) }
                }),
            )
            .layer(cors)
            .with_state(self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn backend() -> Backend {
        Backend::bootstrap(&Environment::from_vars([("FUNCTIONS_EMULATOR", "true")])).unwrap()
    }

    #[test]
    fn test_duplicate_and_invalid_names_rejected() {
        let functions = Functions::new(backend())
            .register("ping", get(|| async { "pong" }))
            .unwrap();

        assert!(matches!(
            functions.register("ping", get(|| async { "again" })),
            Err(Error::Config(_))
        ));
        assert!(Functions::new(backend()).register("", get(|| async { "" })).is_err());
        assert!(Functions::new(backend()).register("a/b", get(|| async { "" })).is_err());
    }

    #[test]
    fn test_manifest_inherits_global_options() {
        let functions = Functions::new(backend())
            .register("ping", get(|| async { "pong" }))
            .unwrap()
            .register("events", get(|| async { "[]" }))
            .unwrap();

        let manifest = functions.manifest();
        assert_eq!(manifest.len(), 2);
        assert!(manifest.iter().all(|f| f.options == GlobalOptions::default()));
        assert_eq!(
            serde_json::to_value(&manifest[0]).unwrap(),
            serde_json::json!({ "name": "ping", "maxInstances": 10, "region": "europe-west4" })
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let app = Functions::new(backend())
            .register("ping", get(|| async { "pong" }))
            .unwrap()
            .into_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/ping")
                    .header("origin", "https://board.example.com")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_function_response_carries_cors_header() {
        let app = Functions::new(backend())
            .register("ping", get(|| async { "pong" }))
            .unwrap()
            .into_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"pong");
    }

    #[tokio::test]
    async fn test_manifest_endpoint() {
        let app = Functions::new(backend())
            .register("ping", get(|| async { "pong" }))
            .unwrap()
            .into_router();

        let response = app
            .oneshot(Request::builder().uri(MANIFEST_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let manifest: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(manifest[0]["name"], "ping");
        assert_eq!(manifest[0]["region"], "europe-west4");
    }
}
