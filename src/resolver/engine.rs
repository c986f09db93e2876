// src/resolver/engine.rs

//! Single-pass version assignment
//!
//! For each requirement, in input order:
//! 1. Known deprecated standard-library modules resolve to the sentinel
//!    version without a registry lookup.
//! 2. A failed research outcome becomes a warning; the requirement
//!    contributes no resolved package.
//! 3. Otherwise the version is assigned by operator policy: `==` pins
//!    the requested version verbatim (no existence check), `>=`/`>`
//!    take the registry latest (falling back to the requested version
//!    when no latest is known), and every other operator takes the
//!    registry latest unconditionally.
//!
//! Whether the registry latest actually satisfies a stated `>=` bound
//! is NOT validated.

use crate::knowledge::{self, BUILTIN_VERSION};
use crate::requirement::{Operator, Requirement};
use crate::research::ResearchOutcome;
use crate::resolver::Conflict;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One assigned name/version pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
}

/// A resolved package flagged as deprecated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedPackage {
    pub name: String,
    pub version: String,
    pub reason: String,
    pub suggested_alternative: Option<String>,
}

/// Outcome of the resolution phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// True iff there are zero conflicts and at least one
    /// resolved-or-deprecated package
    pub success: bool,
    pub resolved_packages: Vec<ResolvedPackage>,
    pub deprecated_packages: Vec<DeprecatedPackage>,
    pub conflicts: Vec<Conflict>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

/// Engine options derived from the submission
#[derive(Debug, Clone, Copy)]
pub struct ResolutionOptions {
    /// Attach the first suggested alternative to deprecation entries
    pub suggest_alternatives: bool,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            suggest_alternatives: true,
        }
    }
}

/// Resolve a requirement set against its research results
pub fn resolve(
    requirements: &[Requirement],
    research: &HashMap<String, ResearchOutcome>,
    options: ResolutionOptions,
) -> ResolutionResult {
    let mut resolved: Vec<ResolvedPackage> = Vec::new();
    let mut deprecated: Vec<DeprecatedPackage> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for requirement in requirements {
        let key = requirement.key();

        // Standard-library modules resolve without registry data
        if let Some(analysis) = knowledge::analyze_builtin(&key) {
            resolved.push(ResolvedPackage {
                name: requirement.name.clone(),
                version: BUILTIN_VERSION.to_string(),
            });
            deprecated.push(deprecation_entry(
                requirement,
                BUILTIN_VERSION,
                &analysis,
                options,
            ));
            continue;
        }

        let Some(findings) = research.get(&key).and_then(|o| o.as_resolved()) else {
            warnings.push(format!("Could not find package '{}'", requirement.name));
            continue;
        };

        let latest = findings.metadata.latest_version.as_str();
        let version = match requirement.operator {
            Operator::Eq => requirement
                .version
                .clone()
                .unwrap_or_else(|| latest.to_string()),
            Operator::Ge | Operator::Gt => {
                if latest.is_empty() {
                    requirement.version.clone().unwrap_or_default()
                } else {
                    latest.to_string()
                }
            }
            _ => latest.to_string(),
        };

        debug!(
            "Assigned {} {} for requirement '{}'",
            key, version, requirement.original_spec
        );

        resolved.push(ResolvedPackage {
            name: requirement.name.clone(),
            version: version.clone(),
        });

        if findings.deprecation.is_deprecated {
            deprecated.push(deprecation_entry(
                requirement,
                &version,
                &findings.deprecation,
                options,
            ));
        }
    }

    let conflicts = detect_duplicates(&resolved);
    if !conflicts.is_empty() {
        dedupe_first_wins(&mut resolved);
        dedupe_deprecated_first_wins(&mut deprecated);
    }

    let success = conflicts.is_empty() && (!resolved.is_empty() || !deprecated.is_empty());

    ResolutionResult {
        success,
        resolved_packages: resolved,
        deprecated_packages: deprecated,
        conflicts,
        warnings,
        error: None,
    }
}

fn deprecation_entry(
    requirement: &Requirement,
    version: &str,
    analysis: &knowledge::DeprecationAnalysis,
    options: ResolutionOptions,
) -> DeprecatedPackage {
    let reason = analysis
        .evidence
        .first()
        .cloned()
        .unwrap_or_else(|| format!("'{}' is deprecated", requirement.name));

    let suggested_alternative = if options.suggest_alternatives {
        analysis.alternatives.first().cloned()
    } else {
        None
    };

    DeprecatedPackage {
        name: requirement.name.clone(),
        version: version.to_string(),
        reason,
        suggested_alternative,
    }
}

/// One conflict per case-insensitive name that appears more than once
fn detect_duplicates(resolved: &[ResolvedPackage]) -> Vec<Conflict> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for package in resolved {
        *counts.entry(package.name.to_lowercase()).or_insert(0) += 1;
    }

    let mut conflicts = Vec::new();
    let mut reported: HashSet<String> = HashSet::new();
    for package in resolved {
        let key = package.name.to_lowercase();
        if counts[&key] > 1 && reported.insert(key.clone()) {
            conflicts.push(Conflict::duplicate_requirement(&key, counts[&key]));
        }
    }
    conflicts
}

/// Names within one result are a set: keep the first occurrence only
fn dedupe_first_wins(resolved: &mut Vec<ResolvedPackage>) {
    let mut seen: HashSet<String> = HashSet::new();
    resolved.retain(|package| seen.insert(package.name.to_lowercase()));
}

fn dedupe_deprecated_first_wins(deprecated: &mut Vec<DeprecatedPackage>) {
    let mut seen: HashSet<String> = HashSet::new();
    deprecated.retain(|package| seen.insert(package.name.to_lowercase()));
}
