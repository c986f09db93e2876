// src/store/mod.rs

//! Durable job store
//!
//! SQLite-backed persistence for job records and final reports, keyed
//! by opaque job ID. Status transitions are monotonic: once a job is
//! `completed` or `failed` it never reverts to `processing`; the
//! UPDATE statements guard on the current status to enforce this at
//! the storage layer.

use crate::error::{Error, Result};
use crate::report::Report;
use crate::request::ResolveRequest;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("invalid job status: {}", s)),
        }
    }
}

/// One tracked analysis job
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub request: ResolveRequest,
    /// Populated once the job completes
    pub report: Option<Report>,
    /// Populated once the job fails
    pub error: Option<String>,
}

/// Job counts by status
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct JobStats {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// SQLite-backed job store
pub struct JobStore {
    conn: Mutex<Connection>,
}

impl JobStore {
    /// Open (or create) the store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (tests and one-shot runs)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("job store lock poisoned".to_string()))
    }

    /// Apply pending schema migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        let current: i32 = conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current >= SCHEMA_VERSION {
            debug!("Job store schema is up to date (version {})", current);
            return Ok(());
        }

        info!("Migrating job store schema {} -> {}", current, SCHEMA_VERSION);
        conn.execute_batch(
            "CREATE TABLE jobs (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL CHECK(status IN ('processing', 'completed', 'failed')),
                created_at TEXT NOT NULL,
                request_json TEXT NOT NULL,
                report_json TEXT,
                error TEXT
            );

            CREATE INDEX idx_jobs_status ON jobs(status);
            CREATE INDEX idx_jobs_created_at ON jobs(created_at);",
        )?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Write the initial record for a newly admitted job
    pub fn insert_processing(&self, id: &str, request: &ResolveRequest) -> Result<()> {
        let request_json = serde_json::to_string(request)?;
        let created_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs (id, status, created_at, request_json) VALUES (?1, ?2, ?3, ?4)",
            params![id, JobStatus::Processing.as_str(), created_at, request_json],
        )?;
        Ok(())
    }

    /// Transition a processing job to completed with its report
    pub fn mark_completed(&self, id: &str, report: &Report) -> Result<()> {
        let report_json = serde_json::to_string(report)?;
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE jobs SET status = ?1, report_json = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                JobStatus::Completed.as_str(),
                report_json,
                id,
                JobStatus::Processing.as_str()
            ],
        )?;
        if updated == 0 {
            warn!("Job {} is not in processing state, completion ignored", id);
        }
        Ok(())
    }

    /// Transition a processing job to failed with an error message
    pub fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE jobs SET status = ?1, error = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                JobStatus::Failed.as_str(),
                error,
                id,
                JobStatus::Processing.as_str()
            ],
        )?;
        if updated == 0 {
            warn!("Job {} is not in processing state, failure ignored", id);
        }
        Ok(())
    }

    /// Fetch a job by ID
    pub fn get(&self, id: &str) -> Result<Option<JobRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, status, created_at, request_json, report_json, error
                 FROM jobs WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, status, created_at, request_json, report_json, error)) = row else {
            return Ok(None);
        };

        let status = JobStatus::from_str(&status).map_err(Error::Storage)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Storage(format!("invalid created_at for job {id}: {e}")))?
            .with_timezone(&Utc);
        let request: ResolveRequest = serde_json::from_str(&request_json)?;
        let report = report_json
            .map(|json| serde_json::from_str::<Report>(&json))
            .transpose()?;

        Ok(Some(JobRecord {
            id,
            status,
            created_at,
            request,
            report,
            error,
        }))
    }

    /// Delete terminal jobs older than the TTL, returning how many
    pub fn cleanup_expired(&self, ttl: Duration) -> Result<usize> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| Error::Storage(format!("invalid job TTL: {e}")))?;
        let cutoff = (Utc::now() - ttl).to_rfc3339();
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM jobs WHERE status != ?1 AND created_at < ?2",
            params![JobStatus::Processing.as_str(), cutoff],
        )?;
        if removed > 0 {
            debug!("Cleaned up {} expired jobs", removed);
        }
        Ok(removed)
    }

    /// Job counts by status
    pub fn stats(&self) -> Result<JobStats> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = JobStats::default();
        for row in rows {
            let (status, count) = row?;
            let count = count as usize;
            match JobStatus::from_str(&status).map_err(Error::Storage)? {
                JobStatus::Processing => stats.processing = count,
                JobStatus::Completed => stats.completed = count,
                JobStatus::Failed => stats.failed = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolutionResult;
    use std::collections::HashMap;
    use std::time::Instant;

    fn request() -> ResolveRequest {
        ResolveRequest::from_specs(vec!["numpy".to_string()])
    }

    fn report(id: &str) -> Report {
        let result = ResolutionResult {
            success: true,
            resolved_packages: vec![],
            deprecated_packages: vec![],
            conflicts: vec![],
            warnings: vec![],
            error: None,
        };
        crate::report::compile(id, &request(), result, &HashMap::new(), Instant::now())
    }

    #[test]
    fn test_insert_and_get() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("job-1", &request()).unwrap();

        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Processing);
        assert_eq!(record.request.requirements, vec!["numpy"]);
        assert!(record.report.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_unknown_id_is_none() {
        let store = JobStore::in_memory().unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_complete_transition() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("job-1", &request()).unwrap();
        store.mark_completed("job-1", &report("job-1")).unwrap();

        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.report.is_some());
    }

    #[test]
    fn test_failed_transition() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("job-1", &request()).unwrap();
        store.mark_failed("job-1", "registry unreachable").unwrap();

        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("registry unreachable"));
    }

    #[test]
    fn test_terminal_states_are_monotonic() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("job-1", &request()).unwrap();
        store.mark_failed("job-1", "boom").unwrap();

        // Terminal jobs never revert
        store.mark_completed("job-1", &report("job-1")).unwrap();
        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);

        store.mark_failed("job-1", "boom again").unwrap();
        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_cleanup_keeps_processing_jobs() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("done", &request()).unwrap();
        store.mark_completed("done", &report("done")).unwrap();
        store.insert_processing("active", &request()).unwrap();

        // Zero TTL: every terminal job is expired
        let removed = store.cleanup_expired(Duration::from_secs(0)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("done").unwrap().is_none());
        assert!(store.get("active").unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let store = JobStore::in_memory().unwrap();
        store.insert_processing("a", &request()).unwrap();
        store.insert_processing("b", &request()).unwrap();
        store.mark_failed("b", "boom").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.processing, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");

        {
            let store = JobStore::open(&path).unwrap();
            store.insert_processing("job-1", &request()).unwrap();
        }

        // Records survive reopen
        let store = JobStore::open(&path).unwrap();
        assert!(store.get("job-1").unwrap().is_some());
    }
}
