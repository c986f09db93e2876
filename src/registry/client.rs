// src/registry/client.rs

//! HTTP client for the PyPI JSON API
//!
//! Wraps reqwest with a timeout, a user agent, and bounded retry for
//! transport failures. A 404 is terminal and never retried; other
//! non-success statuses are registry errors.

use crate::error::{Error, Result};
use crate::registry::{MetadataSource, PackageMetadata};
use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum retry attempts for transport failures
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 500;

/// JSON shape of `GET {base}/{name}/json`
#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    version: String,
    author: Option<String>,
    license: Option<String>,
}

/// PyPI JSON API client
pub struct PypiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl PypiClient {
    /// Create a new registry client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pinion/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Registry(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    fn metadata_url(&self, name: &str) -> String {
        format!("{}/{}/json", self.base_url, name)
    }
}

#[async_trait]
impl MetadataSource for PypiClient {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata> {
        let url = self.metadata_url(name);
        debug!("Fetching registry metadata from {}", url);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(&url).send().await {
                Ok(response) => {
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(Error::PackageNotFound(name.to_string()));
                    }
                    if !response.status().is_success() {
                        return Err(Error::Registry(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let body: PypiResponse = response.json().await.map_err(|e| {
                        Error::Registry(format!("failed to parse registry JSON: {e}"))
                    })?;

                    return Ok(into_metadata(body));
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::Registry(format!(
                            "failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Registry fetch attempt {} failed: {}, retrying...", attempt, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64))
                        .await;
                }
            }
        }
    }
}

fn into_metadata(body: PypiResponse) -> PackageMetadata {
    let mut versions: Vec<String> = body.releases.into_keys().collect();
    versions.sort_by(|a, b| compare_versions(a, b));

    PackageMetadata {
        name: body.info.name.to_lowercase(),
        latest_version: body.info.version,
        versions,
        author: body.info.author.filter(|a| !a.is_empty()),
        license: body.info.license.filter(|l| !l.is_empty()),
    }
}

/// Best-effort version ordering
///
/// Python version strings are frequently not semver ("1.3", "2.0.1rc1");
/// normalize by extracting up to three leading numeric components and
/// fall back to string comparison between equals.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (lenient_semver(a), lenient_semver(b)) {
        (Some(va), Some(vb)) => match va.cmp(&vb) {
            Ordering::Equal => a.cmp(b),
            ord => ord,
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn lenient_semver(s: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }

    let numeric: Vec<u64> = s
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()
        })
        .collect();

    if numeric.is_empty() {
        return None;
    }

    Some(Version::new(
        numeric.first().copied().unwrap_or(0),
        numeric.get(1).copied().unwrap_or(0),
        numeric.get(2).copied().unwrap_or(0),
    ))
}
