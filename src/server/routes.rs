// src/server/routes.rs
//! Axum router configuration for the Pinion server

use crate::server::handlers::{jobs, resolutions};
use crate::server::ServerState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router
pub fn create_router(state: Arc<ServerState>) -> Router {
    // CORS configuration - permissive for now
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Submission endpoint (202 Accepted)
        .route("/v1/resolutions", post(resolutions::submit))
        // Job status and report retrieval (for 202 Accepted polling)
        .route("/v1/jobs/:job_id", get(jobs::get_job))
        // Admin endpoints
        .route("/v1/admin/stats", get(jobs::get_stats))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let config = crate::server::ServerConfig {
            db_path: ":memory:".into(),
            ..Default::default()
        };
        let state = Arc::new(crate::server::ServerState::new(config).unwrap());
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
