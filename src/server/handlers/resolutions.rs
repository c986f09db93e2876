// src/server/handlers/resolutions.rs
//! Submission endpoint - admits a job and launches the pipeline
//!
//! Validation happens synchronously: an empty or malformed requirement
//! list is rejected with 400 and no job is created. A valid submission
//! writes the initial `processing` record, spawns the detached
//! pipeline, and returns 202 Accepted with the job ID for polling.

use crate::request::ResolveRequest;
use crate::server::{pipeline, ServerState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Response for an admitted submission
#[derive(Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub status: &'static str,
    pub message: String,
    pub poll_url: String,
}

/// POST /v1/resolutions
pub async fn submit(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    let requirements = match request.parse_requirements() {
        Ok(requirements) => requirements,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "validation_failed",
                    "message": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let job_id = Uuid::new_v4().to_string();

    if let Err(e) = state.store.insert_processing(&job_id, &request) {
        error!("Failed to admit job {}: {}", job_id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "storage_failed",
                "message": e.to_string(),
            })),
        )
            .into_response();
    }

    info!(
        "Admitted job {} ({} requirements)",
        job_id,
        requirements.len()
    );

    let message = format!(
        "Resolving {} requirements; poll the job for the report",
        requirements.len()
    );
    let poll_url = format!("/v1/jobs/{}", job_id);

    pipeline::spawn_pipeline(state, job_id.clone(), request, requirements);

    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            id: job_id,
            status: "processing",
            message,
            poll_url,
        }),
    )
        .into_response()
}
