// src/knowledge/mod.rs

//! Static deprecation knowledge tables
//!
//! Two curated tables drive the deprecation analysis: published PyPI
//! packages that are abandoned or renamed, and standard-library modules
//! that are deprecated or removed. Built-in modules are never queried
//! against the registry and resolve with the sentinel version
//! `"built-in"`. Both tables are process-wide immutable data built once
//! at first use; updating them is a data change, not a code change.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Sentinel version assigned to standard-library modules
pub const BUILTIN_VERSION: &str = "built-in";

/// Advisory for a deprecated published package
#[derive(Debug, Clone, Copy)]
pub struct PackageAdvisory {
    pub reason: &'static str,
    pub alternatives: &'static [&'static str],
    /// Heuristic confidence in [0,1]
    pub confidence: f64,
}

/// Advisory for a deprecated standard-library module
#[derive(Debug, Clone, Copy)]
pub struct ModuleAdvisory {
    pub reason: &'static str,
    pub alternatives: &'static [&'static str],
}

/// Outcome of the deprecation check for one package
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DeprecationAnalysis {
    pub is_deprecated: bool,
    /// Confidence in [0,1]; 0 when the package is absent from both tables
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub alternatives: Vec<String>,
}

static DEPRECATED_PACKAGES: LazyLock<HashMap<&'static str, PackageAdvisory>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert(
            "nose",
            PackageAdvisory {
                reason: "nose has been unmaintained since 2015 and does not support Python 3.10+",
                alternatives: &["pytest", "nose2"],
                confidence: 0.95,
            },
        );

        m.insert(
            "pycrypto",
            PackageAdvisory {
                reason: "pycrypto is abandoned and has known unpatched vulnerabilities",
                alternatives: &["pycryptodome", "cryptography"],
                confidence: 0.95,
            },
        );

        m.insert(
            "sklearn",
            PackageAdvisory {
                reason: "the sklearn package is a deprecated alias; install scikit-learn instead",
                alternatives: &["scikit-learn"],
                confidence: 0.9,
            },
        );

        m.insert(
            "pil",
            PackageAdvisory {
                reason: "PIL has been unmaintained since 2011",
                alternatives: &["pillow"],
                confidence: 0.95,
            },
        );

        m.insert(
            "distribute",
            PackageAdvisory {
                reason: "distribute was merged back into setuptools in 2013",
                alternatives: &["setuptools"],
                confidence: 0.9,
            },
        );

        m.insert(
            "fabric3",
            PackageAdvisory {
                reason: "fabric3 was a Python 3 fork of fabric 1.x; fabric 2+ supports Python 3 natively",
                alternatives: &["fabric"],
                confidence: 0.85,
            },
        );

        m.insert(
            "django-nose",
            PackageAdvisory {
                reason: "django-nose depends on the unmaintained nose test runner",
                alternatives: &["pytest-django"],
                confidence: 0.85,
            },
        );

        m.insert(
            "flask-script",
            PackageAdvisory {
                reason: "Flask-Script is unmaintained; Flask ships its own CLI since 0.11",
                alternatives: &["flask"],
                confidence: 0.85,
            },
        );

        m
    });

static BUILTIN_MODULES: LazyLock<HashMap<&'static str, ModuleAdvisory>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert(
        "imp",
        ModuleAdvisory {
            reason: "the imp module is deprecated since Python 3.4 and removed in 3.12",
            alternatives: &["importlib"],
        },
    );

    m.insert(
        "optparse",
        ModuleAdvisory {
            reason: "the optparse module is deprecated since Python 3.2",
            alternatives: &["argparse"],
        },
    );

    m.insert(
        "asyncore",
        ModuleAdvisory {
            reason: "the asyncore module is deprecated since Python 3.6 and removed in 3.12",
            alternatives: &["asyncio"],
        },
    );

    m.insert(
        "asynchat",
        ModuleAdvisory {
            reason: "the asynchat module is deprecated since Python 3.6 and removed in 3.12",
            alternatives: &["asyncio"],
        },
    );

    m.insert(
        "distutils",
        ModuleAdvisory {
            reason: "the distutils module is deprecated since Python 3.10 and removed in 3.12",
            alternatives: &["setuptools"],
        },
    );

    m.insert(
        "cgi",
        ModuleAdvisory {
            reason: "the cgi module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["urllib.parse", "email.message"],
        },
    );

    m.insert(
        "cgitb",
        ModuleAdvisory {
            reason: "the cgitb module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["traceback"],
        },
    );

    m.insert(
        "telnetlib",
        ModuleAdvisory {
            reason: "the telnetlib module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["telnetlib3"],
        },
    );

    m.insert(
        "smtpd",
        ModuleAdvisory {
            reason: "the smtpd module is deprecated by PEP 594 and removed in Python 3.12",
            alternatives: &["aiosmtpd"],
        },
    );

    m.insert(
        "imghdr",
        ModuleAdvisory {
            reason: "the imghdr module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["filetype"],
        },
    );

    m.insert(
        "pipes",
        ModuleAdvisory {
            reason: "the pipes module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["subprocess"],
        },
    );

    m.insert(
        "nntplib",
        ModuleAdvisory {
            reason: "the nntplib module is deprecated by PEP 594 and removed in Python 3.13",
            alternatives: &["pynntp"],
        },
    );

    m
});

/// Look up a deprecated published package by lowercase name
pub fn lookup_package(name: &str) -> Option<&'static PackageAdvisory> {
    DEPRECATED_PACKAGES.get(name)
}

/// Look up a deprecated standard-library module by lowercase name
pub fn lookup_builtin(name: &str) -> Option<&'static ModuleAdvisory> {
    BUILTIN_MODULES.get(name)
}

/// Check whether a name is a known deprecated standard-library module
pub fn is_builtin_module(name: &str) -> bool {
    BUILTIN_MODULES.contains_key(name)
}

/// Run the static deprecation check for a published package
///
/// Packages absent from the table are presumed not deprecated with
/// confidence 0.
pub fn analyze_package(name: &str) -> DeprecationAnalysis {
    match lookup_package(name) {
        Some(advisory) => DeprecationAnalysis {
            is_deprecated: true,
            confidence: advisory.confidence,
            evidence: vec![advisory.reason.to_string()],
            alternatives: advisory.alternatives.iter().map(|s| s.to_string()).collect(),
        },
        None => DeprecationAnalysis::default(),
    }
}

/// Deprecation analysis for a standard-library module, if it is one
pub fn analyze_builtin(name: &str) -> Option<DeprecationAnalysis> {
    lookup_builtin(name).map(|advisory| DeprecationAnalysis {
        is_deprecated: true,
        confidence: 1.0,
        evidence: vec![advisory.reason.to_string()],
        alternatives: advisory.alternatives.iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(is_builtin_module("imp"));
        assert!(!is_builtin_module("numpy"));

        let analysis = analyze_builtin("imp").unwrap();
        assert!(analysis.is_deprecated);
        assert!(analysis.evidence[0].contains("imp module is deprecated"));
        assert_eq!(analysis.alternatives[0], "importlib");
    }

    #[test]
    fn test_package_lookup() {
        let analysis = analyze_package("nose");
        assert!(analysis.is_deprecated);
        assert!(analysis.confidence > 0.5);
        assert_eq!(analysis.alternatives[0], "pytest");
    }

    #[test]
    fn test_unknown_package_defaults() {
        let analysis = analyze_package("numpy");
        assert!(!analysis.is_deprecated);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.evidence.is_empty());
        assert!(analysis.alternatives.is_empty());
    }

    #[test]
    fn test_tables_are_disjoint() {
        for name in BUILTIN_MODULES.keys() {
            assert!(
                !DEPRECATED_PACKAGES.contains_key(name),
                "{} is in both tables",
                name
            );
        }
    }
}
