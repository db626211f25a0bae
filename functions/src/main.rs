//! Functions entry point - bootstraps the backend and serves every function.
//!
//! Endpoints:
//! - GET /status - Bootstrap result (mode, project, database, options)
//! - GET /__/functions.json - Deployment manifest

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use backend::{
    init_tracing, json_response, ApiResponse, Backend, DatabaseId, Environment, EnvironmentMode,
    Functions,
};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;

/// Status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse<'a> {
    mode: EnvironmentMode,
    project_id: &'a str,
    database: &'a DatabaseId,
    region: &'a str,
    max_instances: u32,
}

async fn status(State(backend): State<Backend>) -> Response {
    let options = backend.options();
    let status = StatusResponse {
        mode: backend.mode(),
        project_id: backend.app().project_id(),
        database: backend.db().database(),
        region: &options.region,
        max_instances: options.max_instances,
    };

    json_response(StatusCode::OK, ApiResponse::success(status))
}

fn router(backend: Backend) -> backend::Result<Router> {
    Ok(Functions::new(backend)
        .register("status", get(status))?
        .into_router())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = Environment::from_env();
    init_tracing(env.mode());

    let backend = Backend::bootstrap(&env).context("Backend bootstrap failed")?;
    let app = router(backend)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], env.port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Serving functions");
    axum::serve(listener, app).await?;

    Ok(())
}
