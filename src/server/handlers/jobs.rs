// src/server/handlers/jobs.rs
//! Job status endpoint for 202 Accepted polling
//!
//! Returns one of three shapes by job state, checked in this order:
//! still processing, terminally failed, completed with the full report.
//! An unknown or expired ID is 404, which is a distinct outcome from
//! "still processing".

use crate::server::ServerState;
use crate::store::JobStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// GET /v1/jobs/:job_id
pub async fn get_job(
    State(state): State<Arc<ServerState>>,
    Path(job_id): Path<String>,
) -> Response {
    let record = match state.store.get(&job_id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": "not_found",
                    "message": format!("Job {} not found or expired", job_id),
                })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Job store read failed for {}: {}", job_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "storage_failed",
                    "message": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    // Order matters: a record can carry both a partial report and a
    // terminal error, so processing and failed are checked first.
    match record.status {
        JobStatus::Processing => Json(serde_json::json!({
            "id": record.id,
            "status": "processing",
            "created_at": record.created_at.to_rfc3339(),
            "original_request": record.request,
        }))
        .into_response(),
        JobStatus::Failed => Json(serde_json::json!({
            "id": record.id,
            "status": "failed",
            "error": record.error.unwrap_or_else(|| "unknown error".to_string()),
            "created_at": record.created_at.to_rfc3339(),
        }))
        .into_response(),
        JobStatus::Completed => {
            let Some(report) = record.report else {
                tracing::error!("Completed job {} has no stored report", record.id);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "storage_failed",
                        "message": "completed job has no report",
                    })),
                )
                    .into_response();
            };

            match serde_json::to_value(&report) {
                Ok(serde_json::Value::Object(mut body)) => {
                    body.insert(
                        "status".to_string(),
                        serde_json::Value::String("completed".to_string()),
                    );
                    Json(serde_json::Value::Object(body)).into_response()
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "storage_failed",
                        "message": "report serialization failed",
                    })),
                )
                    .into_response(),
            }
        }
    }
}

/// GET /v1/admin/stats
pub async fn get_stats(State(state): State<Arc<ServerState>>) -> Response {
    let jobs = match state.store.stats() {
        Ok(stats) => stats,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "storage_failed",
                    "message": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let cache = state.cache.stats().await;

    Json(serde_json::json!({
        "jobs": jobs,
        "cache": cache,
    }))
    .into_response()
}
