// src/resolver/mod.rs

//! Version resolution engine
//!
//! Assigns one version per requirement name from the research results,
//! detects duplicate-name conflicts, and merges deprecation findings.
//! This is a best-effort single-pass engine: it does not walk a
//! transitive dependency graph and does not backtrack.

mod conflict;
mod engine;

pub use conflict::Conflict;
pub use engine::{
    resolve, DeprecatedPackage, ResolutionOptions, ResolutionResult, ResolvedPackage,
};
