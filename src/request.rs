// src/request.rs

//! Resolution request shape
//!
//! The submission body accepted by the orchestrator and echoed back
//! verbatim inside the final report. Requirements are submitted as raw
//! spec strings and parsed at admission time.

use crate::error::{Error, Result};
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};

fn default_python_version() -> String {
    "3.9".to_string()
}

fn default_true() -> bool {
    true
}

/// One submitted analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Requirement spec strings ("pandas>=1.3.0")
    pub requirements: Vec<String>,

    /// Target Python runtime version
    #[serde(default = "default_python_version")]
    pub python_version: String,

    /// Allow pre-release versions to be assigned
    #[serde(default)]
    pub allow_prereleases: bool,

    /// Prefer stable releases when assigning versions
    #[serde(default = "default_true")]
    pub prefer_stable: bool,

    /// Annotate deprecated packages in the generated manifest
    #[serde(default)]
    pub exclude_deprecated: bool,

    /// Attach suggested alternatives to deprecation findings
    #[serde(default = "default_true")]
    pub suggest_alternatives: bool,
}

impl ResolveRequest {
    /// Build a request from raw spec strings with default options
    pub fn from_specs(specs: Vec<String>) -> Self {
        Self {
            requirements: specs,
            python_version: default_python_version(),
            allow_prereleases: false,
            prefer_stable: true,
            exclude_deprecated: false,
            suggest_alternatives: true,
        }
    }

    /// Validate the submission and parse every requirement
    ///
    /// An empty requirement list or any malformed spec is a validation
    /// error; no job is created for an invalid submission.
    pub fn parse_requirements(&self) -> Result<Vec<Requirement>> {
        if self.requirements.is_empty() {
            return Err(Error::Validation(
                "at least one requirement is required".to_string(),
            ));
        }
        self.requirements
            .iter()
            .map(|spec| Requirement::parse(spec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_submission_rejected() {
        let request = ResolveRequest::from_specs(vec![]);
        assert!(request.parse_requirements().is_err());
    }

    #[test]
    fn test_malformed_spec_rejected() {
        let request = ResolveRequest::from_specs(vec!["numpy".into(), "==1.0".into()]);
        assert!(request.parse_requirements().is_err());
    }

    #[test]
    fn test_defaults_from_json() {
        let request: ResolveRequest =
            serde_json::from_str(r#"{"requirements": ["numpy"]}"#).unwrap();
        assert_eq!(request.python_version, "3.9");
        assert!(!request.allow_prereleases);
        assert!(request.prefer_stable);
        assert!(!request.exclude_deprecated);
        assert!(request.suggest_alternatives);
    }
}
