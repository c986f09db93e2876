// src/requirement.rs

//! Requirement specifier parsing
//!
//! Parses PEP 440-style requirement strings ("pandas>=1.3.0") into a
//! name, a comparison operator, and a version. Names are case-folded to
//! lowercase for identity purposes; the original casing and the full
//! original spec string are preserved for display.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Valid PEP 508 project name: alphanumeric, with dots, underscores and
/// hyphens allowed between alphanumerics.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("invalid name regex")
});

/// Version comparison operators, longest first so that multi-character
/// operators win over their prefixes during parsing.
const OPERATORS: [&str; 8] = ["===", "==", ">=", "<=", "!=", "~=", ">", "<"];

/// Comparison operator of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// No operator: any version is acceptable
    #[default]
    Any,
    /// `==` exact version match
    Eq,
    /// `>=` minimum version (inclusive)
    Ge,
    /// `>` minimum version (exclusive)
    Gt,
    /// `<=` maximum version (inclusive)
    Le,
    /// `<` maximum version (exclusive)
    Lt,
    /// `!=` version exclusion
    Ne,
    /// `~=` compatible release
    Compatible,
    /// `===` arbitrary (string) equality
    Arbitrary,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Any => "",
            Operator::Eq => "==",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Lt => "<",
            Operator::Ne => "!=",
            Operator::Compatible => "~=",
            Operator::Arbitrary => "===",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Operator::Eq),
            ">=" => Some(Operator::Ge),
            ">" => Some(Operator::Gt),
            "<=" => Some(Operator::Le),
            "<" => Some(Operator::Lt),
            "!=" => Some(Operator::Ne),
            "~=" => Some(Operator::Compatible),
            "===" => Some(Operator::Arbitrary),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named-package version constraint as submitted by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name with its original casing, for display
    pub name: String,
    pub operator: Operator,
    /// Requested version, present iff an operator is present
    pub version: Option<String>,
    /// True iff the operator is `==`
    pub fixed: bool,
    /// The spec string exactly as submitted; never empty
    pub original_spec: String,
}

impl Requirement {
    /// Parse a requirement spec string
    ///
    /// Accepts the bare-name form ("numpy"), the constrained form
    /// ("pandas>=1.3.0"), extras ("requests[security]==2.31.0", extras
    /// are discarded), and environment markers after a semicolon
    /// (discarded).
    pub fn parse(spec: &str) -> Result<Self> {
        let original = spec.trim();
        if original.is_empty() {
            return Err(Error::Validation("empty requirement spec".to_string()));
        }

        // Environment markers are outside this resolver's scope
        let body = original.split(';').next().unwrap_or(original).trim();

        let (name_part, operator, version) = match split_on_operator(body) {
            Some((name, op, ver)) => {
                let ver = ver.trim();
                if ver.is_empty() {
                    return Err(Error::Validation(format!(
                        "requirement '{}' has an operator but no version",
                        original
                    )));
                }
                (name.trim(), op, Some(ver.to_string()))
            }
            None => (body, Operator::Any, None),
        };

        // Strip extras: "requests[security]" -> "requests"
        let name = match name_part.find('[') {
            Some(idx) => name_part[..idx].trim(),
            None => name_part,
        };

        if name.is_empty() {
            return Err(Error::Validation(format!(
                "requirement '{}' has no package name",
                original
            )));
        }
        if !NAME_RE.is_match(name) {
            return Err(Error::Validation(format!(
                "invalid package name '{}' in requirement '{}'",
                name, original
            )));
        }

        Ok(Self {
            name: name.to_string(),
            operator,
            version,
            fixed: operator == Operator::Eq,
            original_spec: original.to_string(),
        })
    }

    /// Lowercase identity key for cache and duplicate detection
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}{}{}", self.name, self.operator, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Split a spec body at its first operator occurrence
///
/// Returns (name, operator, version-tail) or None when the body carries
/// no operator. Multi-character operators are matched before their
/// single-character prefixes.
fn split_on_operator(body: &str) -> Option<(&str, Operator, &str)> {
    let idx = body.find(['=', '<', '>', '!', '~'])?;
    for token in OPERATORS {
        if body[idx..].starts_with(token) {
            let op = Operator::from_token(token)?;
            return Some((&body[..idx], op, &body[idx + token.len()..]));
        }
    }
    // An operator character that doesn't form a known operator ("=1.0")
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("numpy").unwrap();
        assert_eq!(req.name, "numpy");
        assert_eq!(req.operator, Operator::Any);
        assert_eq!(req.version, None);
        assert!(!req.fixed);
        assert_eq!(req.original_spec, "numpy");
    }

    #[test]
    fn test_parse_pinned() {
        let req = Requirement::parse("Django==3.2").unwrap();
        assert_eq!(req.name, "Django");
        assert_eq!(req.key(), "django");
        assert_eq!(req.operator, Operator::Eq);
        assert_eq!(req.version.as_deref(), Some("3.2"));
        assert!(req.fixed);
    }

    #[test]
    fn test_parse_lower_bound() {
        let req = Requirement::parse("pandas >= 1.3.0").unwrap();
        assert_eq!(req.name, "pandas");
        assert_eq!(req.operator, Operator::Ge);
        assert_eq!(req.version.as_deref(), Some("1.3.0"));
        assert!(!req.fixed);
    }

    #[test]
    fn test_parse_all_operators() {
        let cases = [
            ("a==1", Operator::Eq),
            ("a>=1", Operator::Ge),
            ("a>1", Operator::Gt),
            ("a<=1", Operator::Le),
            ("a<1", Operator::Lt),
            ("a!=1", Operator::Ne),
            ("a~=1.4", Operator::Compatible),
            ("a===1.0", Operator::Arbitrary),
        ];
        for (spec, op) in cases {
            let req = Requirement::parse(spec).unwrap();
            assert_eq!(req.operator, op, "spec: {}", spec);
        }
        // Only `==` marks the requirement as fixed
        assert!(!Requirement::parse("a===1.0").unwrap().fixed);
    }

    #[test]
    fn test_parse_extras_and_markers() {
        let req = Requirement::parse("requests[security]==2.31.0 ; python_version < '3.10'")
            .unwrap();
        assert_eq!(req.name, "requests");
        assert_eq!(req.version.as_deref(), Some("2.31.0"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("   ").is_err());
    }

    #[test]
    fn test_parse_rejects_operator_without_version() {
        assert!(Requirement::parse("numpy==").is_err());
        assert!(Requirement::parse(">=1.0").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!(Requirement::parse("-numpy").is_err());
        assert!(Requirement::parse("num py").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let req = Requirement::parse("pandas>=1.3.0").unwrap();
        assert_eq!(req.to_string(), "pandas>=1.3.0");
    }
}
