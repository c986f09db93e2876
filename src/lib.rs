// src/lib.rs

//! Pinion - asynchronous requirement resolution service
//!
//! Accepts named-package version constraints, researches each package
//! against a PyPI-compatible registry, assigns a best-effort consistent
//! version set, flags deprecated packages and standard-library modules,
//! and compiles a manifest plus narrative report retrievable by job ID.
//!
//! # Architecture
//!
//! - Jobs: submissions are admitted synchronously and processed by a
//!   detached background pipeline (research -> resolve -> compile)
//! - Durable state: job records and reports live in SQLite; status
//!   transitions are monotonic (processing -> completed/failed)
//! - Isolation: one bad package name becomes a warning, never a failed
//!   job; only phase-level errors terminal-fail a job
//! - Shared caches: registry metadata is cached by lowercase name with
//!   a fixed TTL across concurrent jobs

pub mod error;
pub mod knowledge;
pub mod registry;
pub mod report;
pub mod request;
pub mod requirement;
pub mod research;
pub mod resolver;
pub mod server;
pub mod store;

pub use error::{Error, Result};
pub use registry::{MetadataCache, MetadataSource, PackageMetadata, PypiClient};
pub use report::{Report, ReportMetadata};
pub use request::ResolveRequest;
pub use requirement::{Operator, Requirement};
pub use research::{PackageResearch, ResearchOutcome, ResearchUnit};
pub use resolver::{
    Conflict, DeprecatedPackage, ResolutionOptions, ResolutionResult, ResolvedPackage,
};
pub use server::{create_router, run_server, PinionConfig, ServerConfig, ServerState};
pub use store::{JobRecord, JobStats, JobStatus, JobStore};
