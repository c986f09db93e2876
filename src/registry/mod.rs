// src/registry/mod.rs

//! Package registry access
//!
//! Read-only metadata lookups against a PyPI-compatible JSON API, with
//! a shared TTL cache in front. Absence of a package is an expected
//! outcome, surfaced as [`Error::PackageNotFound`].
//!
//! [`Error::PackageNotFound`]: crate::error::Error::PackageNotFound

mod cache;
mod client;

pub use cache::{CacheStats, MetadataCache};
pub use client::PypiClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Registry metadata for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Canonical (lowercase) package name
    pub name: String,
    /// Latest published version as reported by the registry
    pub latest_version: String,
    /// All published versions, oldest first
    pub versions: Vec<String>,
    pub author: Option<String>,
    pub license: Option<String>,
}

/// Read-only source of package metadata
///
/// The production implementation is [`PypiClient`]; tests substitute a
/// deterministic stub.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for a package by lowercase name
    ///
    /// Returns `Error::PackageNotFound` when the registry reports the
    /// package does not exist.
    async fn fetch(&self, name: &str) -> Result<PackageMetadata>;
}
