// src/resolver/conflict.rs

//! Conflict types for requirement resolution
//!
//! The engine currently produces a single conflict kind: the same
//! package name requested more than once. Deeper semantic checks
//! (mutually exclusive constraints on one name) are out of scope for
//! this engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A detected inability to satisfy all requirements for a package name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Names of the packages involved (lowercase)
    pub packages: Vec<String>,
    pub reason: String,
    pub suggested_resolution: Option<String>,
}

impl Conflict {
    /// Conflict for a name that appears in more than one requirement
    pub fn duplicate_requirement(name: &str, occurrences: usize) -> Self {
        Self {
            packages: vec![name.to_string()],
            reason: format!(
                "Package '{}' is requested {} times with potentially different constraints",
                name, occurrences
            ),
            suggested_resolution: Some(format!(
                "Consolidate the duplicate requirements for '{}' into a single entry",
                name
            )),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reason, self.packages.join(", "))
    }
}
