// src/research/mod.rs

//! Package research unit
//!
//! Gathers registry metadata and a deprecation analysis for one package
//! at a time. Per-package failures are isolated: a failed lookup for one
//! package is recorded as a failed outcome and never aborts research for
//! the rest of the set.
//!
//! Known deprecated standard-library modules short-circuit here: they
//! are never queried against the registry and carry the sentinel
//! version `"built-in"`.

use crate::knowledge::{self, DeprecationAnalysis, BUILTIN_VERSION};
use crate::registry::{MetadataCache, MetadataSource, PackageMetadata};
use crate::requirement::Requirement;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Research findings for one package
#[derive(Debug, Clone)]
pub struct PackageResearch {
    pub metadata: PackageMetadata,
    pub deprecation: DeprecationAnalysis,
}

/// Per-package research outcome
///
/// A tagged result rather than a structurally-probed object, so callers
/// cannot forget the failure arm.
#[derive(Debug, Clone)]
pub enum ResearchOutcome {
    Resolved(Box<PackageResearch>),
    Failed { message: String },
}

impl ResearchOutcome {
    pub fn as_resolved(&self) -> Option<&PackageResearch> {
        match self {
            ResearchOutcome::Resolved(research) => Some(research),
            ResearchOutcome::Failed { .. } => None,
        }
    }
}

/// Research unit backed by a metadata source and the shared cache
#[derive(Clone)]
pub struct ResearchUnit {
    source: Arc<dyn MetadataSource>,
    cache: Arc<MetadataCache>,
}

impl ResearchUnit {
    pub fn new(source: Arc<dyn MetadataSource>, cache: Arc<MetadataCache>) -> Self {
        Self { source, cache }
    }

    /// Research one package by name
    ///
    /// Never returns an error: failures are folded into
    /// [`ResearchOutcome::Failed`] so one bad package cannot deny a
    /// report for the rest of the set.
    pub async fn research(&self, name: &str) -> ResearchOutcome {
        let key = name.to_lowercase();

        // Deprecated standard-library modules never hit the registry
        if let Some(deprecation) = knowledge::analyze_builtin(&key) {
            return ResearchOutcome::Resolved(Box::new(PackageResearch {
                metadata: PackageMetadata {
                    name: key,
                    latest_version: BUILTIN_VERSION.to_string(),
                    versions: Vec::new(),
                    author: None,
                    license: None,
                },
                deprecation,
            }));
        }

        if let Some(metadata) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return ResearchOutcome::Resolved(Box::new(PackageResearch {
                deprecation: knowledge::analyze_package(&key),
                metadata,
            }));
        }

        match self.source.fetch(&key).await {
            Ok(metadata) => {
                self.cache.insert(&key, metadata.clone()).await;
                ResearchOutcome::Resolved(Box::new(PackageResearch {
                    deprecation: knowledge::analyze_package(&key),
                    metadata,
                }))
            }
            Err(crate::error::Error::PackageNotFound(_)) => ResearchOutcome::Failed {
                message: format!("Package '{}' not found in the registry", name),
            },
            Err(e) => {
                warn!("Research failed for {}: {}", name, e);
                ResearchOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Research every distinct requirement name, keyed by lowercase name
    ///
    /// Lookups run sequentially in input order; total latency scales
    /// linearly with the number of distinct packages.
    pub async fn research_many(
        &self,
        requirements: &[Requirement],
    ) -> HashMap<String, ResearchOutcome> {
        let mut results = HashMap::new();
        for requirement in requirements {
            let key = requirement.key();
            if results.contains_key(&key) {
                continue;
            }
            let outcome = self.research(&requirement.name).await;
            results.insert(key, outcome);
        }
        results
    }
}
