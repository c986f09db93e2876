// src/server/pipeline.rs

//! Background resolution pipeline
//!
//! One pipeline per job, launched detached at submission time. The
//! three phases (research, resolve, compile) run strictly in sequence;
//! any phase error or panic terminal-fails the job, so a job can never
//! be left permanently stuck in `processing` by the pipeline itself.
//!
//! There is no timeout or cancellation path once a pipeline has
//! started; callers poll until a terminal state and apply their own
//! give-up threshold.

use crate::error::{Error, Result};
use crate::report::{self, Report};
use crate::request::ResolveRequest;
use crate::requirement::Requirement;
use crate::research::ResearchUnit;
use crate::resolver::{self, ResolutionOptions};
use crate::server::ServerState;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Launch the pipeline for an admitted job without blocking the caller
///
/// The phase task is spawned separately and supervised, so a panic in
/// any phase is caught and converted to a terminal `failed` record
/// instead of vanishing with the task.
pub fn spawn_pipeline(
    state: Arc<ServerState>,
    job_id: String,
    request: ResolveRequest,
    requirements: Vec<Requirement>,
) {
    tokio::spawn(async move {
        let worker = tokio::spawn(execute(
            state.research.clone(),
            job_id.clone(),
            request,
            requirements,
        ));

        let outcome = match worker.await {
            Ok(Ok(report)) => {
                info!("Job {} completed", job_id);
                state.store.mark_completed(&job_id, &report)
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", job_id, e);
                state.store.mark_failed(&job_id, &e.to_string())
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    format!("pipeline panicked: {}", join_error)
                } else {
                    format!("pipeline aborted: {}", join_error)
                };
                error!("Job {} failed: {}", job_id, message);
                state
                    .store
                    .mark_failed(&job_id, &Error::Pipeline(message).to_string())
            }
        };

        if let Err(e) = outcome {
            error!("Failed to persist terminal state for job {}: {}", job_id, e);
        }
    });
}

/// Run the three pipeline phases and compile the report
///
/// Shared by the background pipeline and the one-shot CLI path.
pub async fn execute(
    research: ResearchUnit,
    job_id: String,
    request: ResolveRequest,
    requirements: Vec<Requirement>,
) -> Result<Report> {
    let started = Instant::now();

    let phase_started = Instant::now();
    let research_results = research.research_many(&requirements).await;
    info!(
        "Job {}: research phase done ({} packages, {:?})",
        job_id,
        research_results.len(),
        phase_started.elapsed()
    );

    let phase_started = Instant::now();
    let options = ResolutionOptions {
        suggest_alternatives: request.suggest_alternatives,
    };
    let result = resolver::resolve(&requirements, &research_results, options);
    info!(
        "Job {}: resolution phase done (success={}, {} conflicts, {:?})",
        job_id,
        result.success,
        result.conflicts.len(),
        phase_started.elapsed()
    );

    let phase_started = Instant::now();
    let report = report::compile(&job_id, &request, result, &research_results, started);
    info!(
        "Job {}: report phase done ({:?})",
        job_id,
        phase_started.elapsed()
    );

    Ok(report)
}
