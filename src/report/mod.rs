// src/report/mod.rs

//! Report compilation
//!
//! Turns a resolution result plus the research findings into the
//! persisted report: a requirements-style manifest sorted
//! alphabetically, a narrative document with a fixed section order,
//! and one analysis line per researched package. Report field names are
//! read verbatim by external consumers; renaming any of them is a
//! breaking interface change.

use crate::knowledge::BUILTIN_VERSION;
use crate::request::ResolveRequest;
use crate::research::ResearchOutcome;
use crate::resolver::ResolutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::time::Instant;

/// Summary numbers attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub python_version: String,
    pub total_packages: usize,
    pub deprecated_count: usize,
    pub conflict_count: usize,
    pub processing_time_ms: u64,
}

/// The persisted analysis report, retrieved by job ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub original_request: ResolveRequest,
    pub resolution_result: ResolutionResult,
    pub manifest_text: String,
    pub narrative_text: String,
    pub per_package_analysis: BTreeMap<String, String>,
    pub metadata: ReportMetadata,
}

/// Compile the final report for a job
///
/// `started` is the pipeline start time, so `processing_time_ms` spans
/// all three phases.
pub fn compile(
    job_id: &str,
    request: &ResolveRequest,
    result: ResolutionResult,
    research: &HashMap<String, ResearchOutcome>,
    started: Instant,
) -> Report {
    let manifest_text = render_manifest(request, &result, research);
    let narrative_text = render_narrative(&result);
    let per_package_analysis = render_analysis(research);

    let metadata = ReportMetadata {
        python_version: request.python_version.clone(),
        total_packages: request.requirements.len(),
        deprecated_count: result.deprecated_packages.len(),
        conflict_count: result.conflicts.len(),
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    Report {
        id: job_id.to_string(),
        created_at: Utc::now(),
        original_request: request.clone(),
        resolution_result: result,
        manifest_text,
        narrative_text,
        per_package_analysis,
        metadata,
    }
}

/// Render the manifest, alphabetically sorted by package name
///
/// Lines whose version did not come from the primary registry carry a
/// provenance comment.
fn render_manifest(
    request: &ResolveRequest,
    result: &ResolutionResult,
    research: &HashMap<String, ResearchOutcome>,
) -> String {
    let mut packages = result.resolved_packages.clone();
    packages.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut lines = Vec::with_capacity(packages.len());
    for package in &packages {
        let key = package.name.to_lowercase();
        let mut notes: Vec<String> = Vec::new();

        if package.version == BUILTIN_VERSION {
            notes.push("deprecated standard-library module, nothing to install".to_string());
        } else if let Some(findings) = research.get(&key).and_then(|o| o.as_resolved()) {
            let known = package.version == findings.metadata.latest_version
                || findings.metadata.versions.contains(&package.version);
            if !known {
                notes.push("not verified against the registry index".to_string());
            }
        }

        if request.exclude_deprecated {
            if let Some(entry) = result
                .deprecated_packages
                .iter()
                .find(|d| d.name.to_lowercase() == key)
            {
                match &entry.suggested_alternative {
                    Some(alt) => notes.push(format!("deprecated, consider {}", alt)),
                    None => notes.push("deprecated".to_string()),
                }
            }
        }

        let mut line = format!("{}=={}", package.name, package.version);
        if !notes.is_empty() {
            let _ = write!(line, "  # {}", notes.join("; "));
        }
        lines.push(line);
    }

    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Render the narrative document
///
/// Section order is fixed: status line, conflict count, deprecated
/// count, resolved-package list, deprecated-package detail blocks,
/// conflict detail blocks.
fn render_narrative(result: &ResolutionResult) -> String {
    let mut text = String::new();

    let status = if result.success { "success" } else { "failed" };
    let _ = writeln!(text, "Resolution status: {}", status);
    let _ = writeln!(text, "Conflicts: {}", result.conflicts.len());
    let _ = writeln!(
        text,
        "Deprecated packages: {}",
        result.deprecated_packages.len()
    );

    let _ = writeln!(text, "\nResolved packages:");
    if result.resolved_packages.is_empty() {
        let _ = writeln!(text, "  (none)");
    }
    for package in &result.resolved_packages {
        let _ = writeln!(text, "  - {} {}", package.name, package.version);
    }

    if !result.deprecated_packages.is_empty() {
        let _ = writeln!(text, "\nDeprecated package details:");
        for entry in &result.deprecated_packages {
            let _ = writeln!(text, "  {} ({})", entry.name, entry.version);
            let _ = writeln!(text, "    Reason: {}", entry.reason);
            if let Some(alt) = &entry.suggested_alternative {
                let _ = writeln!(text, "    Suggested alternative: {}", alt);
            }
        }
    }

    if !result.conflicts.is_empty() {
        let _ = writeln!(text, "\nConflict details:");
        for conflict in &result.conflicts {
            let _ = writeln!(text, "  {}", conflict.packages.join(", "));
            let _ = writeln!(text, "    Reason: {}", conflict.reason);
            if let Some(resolution) = &conflict.suggested_resolution {
                let _ = writeln!(text, "    Suggested resolution: {}", resolution);
            }
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(text, "\nWarnings:");
        for warning in &result.warnings {
            let _ = writeln!(text, "  - {}", warning);
        }
    }

    text
}

/// One synthesized analysis line per researched package
fn render_analysis(research: &HashMap<String, ResearchOutcome>) -> BTreeMap<String, String> {
    let mut analysis = BTreeMap::new();

    for (name, outcome) in research {
        let line = match outcome {
            ResearchOutcome::Resolved(findings) => {
                if findings.metadata.latest_version == BUILTIN_VERSION {
                    let alternatives = findings.deprecation.alternatives.join(", ");
                    format!(
                        "deprecated standard-library module; alternatives: {}",
                        alternatives
                    )
                } else if findings.deprecation.is_deprecated {
                    format!(
                        "{} known versions; latest {}; deprecated ({:.0}% confidence); alternatives: {}",
                        findings.metadata.versions.len(),
                        findings.metadata.latest_version,
                        findings.deprecation.confidence * 100.0,
                        findings.deprecation.alternatives.join(", ")
                    )
                } else {
                    format!(
                        "{} known versions; latest {}; not deprecated",
                        findings.metadata.versions.len(),
                        findings.metadata.latest_version
                    )
                }
            }
            ResearchOutcome::Failed { message } => format!("research failed: {}", message),
        };
        analysis.insert(name.clone(), line);
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge;
    use crate::registry::PackageMetadata;
    use crate::requirement::Requirement;
    use crate::research::PackageResearch;
    use crate::resolver::{resolve, ResolutionOptions};

    fn found(name: &str, latest: &str, versions: &[&str]) -> (String, ResearchOutcome) {
        (
            name.to_string(),
            ResearchOutcome::Resolved(Box::new(PackageResearch {
                metadata: PackageMetadata {
                    name: name.to_string(),
                    latest_version: latest.to_string(),
                    versions: versions.iter().map(|v| v.to_string()).collect(),
                    author: None,
                    license: None,
                },
                deprecation: knowledge::analyze_package(name),
            })),
        )
    }

    fn reqs(specs: &[&str]) -> Vec<Requirement> {
        specs
            .iter()
            .map(|s| Requirement::parse(s).unwrap())
            .collect()
    }

    fn compile_for(
        specs: &[&str],
        research: HashMap<String, ResearchOutcome>,
        request: Option<ResolveRequest>,
    ) -> Report {
        let request = request.unwrap_or_else(|| {
            ResolveRequest::from_specs(specs.iter().map(|s| s.to_string()).collect())
        });
        let requirements = reqs(specs);
        let result = resolve(&requirements, &research, ResolutionOptions::default());
        compile("job-1", &request, result, &research, Instant::now())
    }

    #[test]
    fn test_manifest_is_sorted_regardless_of_input_order() {
        let research = [
            found("zope", "5.8", &["5.8"]),
            found("aiohttp", "3.8.4", &["3.8.4"]),
            found("numpy", "1.24.3", &["1.24.3"]),
        ]
        .into_iter()
        .collect();

        let report = compile_for(&["zope", "numpy", "aiohttp"], research, None);

        let lines: Vec<&str> = report.manifest_text.lines().collect();
        assert_eq!(
            lines,
            vec!["aiohttp==3.8.4", "numpy==1.24.3", "zope==5.8"]
        );
    }

    #[test]
    fn test_builtin_line_carries_provenance_comment() {
        let report = compile_for(&["imp"], HashMap::new(), None);
        assert!(report
            .manifest_text
            .starts_with("imp==built-in  # deprecated standard-library module"));
    }

    #[test]
    fn test_unverified_pin_carries_provenance_comment() {
        let research = [found("numpy", "1.24.3", &["1.24.2", "1.24.3"])]
            .into_iter()
            .collect();
        let report = compile_for(&["numpy==0.0.999"], research, None);
        assert!(report.manifest_text.contains("numpy==0.0.999  # not verified"));
    }

    #[test]
    fn test_exclude_deprecated_annotates_lines() {
        let research = [found("nose", "1.3.7", &["1.3.7"])].into_iter().collect();
        let mut request = ResolveRequest::from_specs(vec!["nose".into()]);
        request.exclude_deprecated = true;

        let report = compile_for(&["nose"], research, Some(request));
        assert!(report.manifest_text.contains("deprecated, consider pytest"));
    }

    #[test]
    fn test_narrative_section_order() {
        let research = [found("django", "4.2.1", &["3.2", "4.2.1"])]
            .into_iter()
            .collect();
        let report = compile_for(&["django>=4.0", "django==3.2", "imp"], research, None);

        let text = &report.narrative_text;
        let status = text.find("Resolution status:").unwrap();
        let conflicts = text.find("Conflicts:").unwrap();
        let deprecated = text.find("Deprecated packages:").unwrap();
        let resolved = text.find("Resolved packages:").unwrap();
        let dep_detail = text.find("Deprecated package details:").unwrap();
        let conflict_detail = text.find("Conflict details:").unwrap();

        assert!(status < conflicts);
        assert!(conflicts < deprecated);
        assert!(deprecated < resolved);
        assert!(resolved < dep_detail);
        assert!(dep_detail < conflict_detail);
    }

    #[test]
    fn test_metadata_counts() {
        let research = [
            found("numpy", "1.24.3", &["1.24.3"]),
            found("nose", "1.3.7", &["1.3.7"]),
        ]
        .into_iter()
        .collect();

        let report = compile_for(&["numpy", "nose"], research, None);

        assert_eq!(report.metadata.python_version, "3.9");
        assert_eq!(report.metadata.total_packages, 2);
        assert_eq!(report.metadata.deprecated_count, 1);
        assert_eq!(report.metadata.conflict_count, 0);
    }

    #[test]
    fn test_per_package_analysis_lines() {
        let research = [
            found("numpy", "1.24.3", &["1.24.2", "1.24.3"]),
            found("nose", "1.3.7", &["1.3.7"]),
        ]
        .into_iter()
        .collect();

        let report = compile_for(&["numpy", "nose", "imp"], research, None);

        assert!(report.per_package_analysis["numpy"].contains("2 known versions"));
        assert!(report.per_package_analysis["numpy"].contains("not deprecated"));
        assert!(report.per_package_analysis["nose"].contains("alternatives: pytest"));
    }
}
