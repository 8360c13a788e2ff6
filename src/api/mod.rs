//! Local control API for the recording workflow.
//!
//! Provides HTTP endpoints for:
//! - Recording control (start, stop)
//! - Session status
//! - Service info

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::recording::ControlState;

pub struct ApiServer {
    port: u16,
    state: ControlState,
}

impl ApiServer {
    pub fn new(state: ControlState, port: u16) -> Self {
        Self { port, state }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .route("/version", get(version))
            .merge(routes::recording::router(self.state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("control API listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /              - Service info");
        info!("  GET  /version       - Version info");
        info!("  POST /record/start  - Start recording");
        info!("  POST /record/stop   - Stop recording and submit");
        info!("  GET  /status        - Session status");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "voxpost",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "voxpost"
    }))
}
