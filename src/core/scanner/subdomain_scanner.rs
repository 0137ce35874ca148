// src/core/scanner/subdomain_scanner.rs

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::core::models::{SourceOutcome, SourceStatus, SubdomainReport};
use crate::errors::SourceError;

pub const CRTSH_BASE_URL: &str = "https://crt.sh";
pub const OTX_BASE_URL: &str = "https://otx.alienvault.com";

/// Default budget for one source. Certificate-transparency queries are slow.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(120);

/// A public intelligence source that knows hostnames under a domain.
#[async_trait]
pub trait SubdomainSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Raw hostnames as the source returns them. Filtering happens in the aggregator.
    async fn query(&self, client: &Client, domain: &str) -> Result<Vec<String>, SourceError>;
}

// --- crt.sh ---

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

/// Certificate-transparency search on crt.sh.
pub struct CrtSh {
    base_url: String,
}

impl CrtSh {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

#[async_trait]
impl SubdomainSource for CrtSh {
    fn name(&self) -> &'static str {
        "crt.sh"
    }

    async fn query(&self, client: &Client, domain: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = client
            .get(&url)
            .query(&[("q", format!("%.{}", domain).as_str()), ("output", "json")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }
        let entries: Vec<CrtShEntry> = response.json().await?;
        // One certificate can list several names, one per line.
        Ok(entries
            .into_iter()
            .flat_map(|entry| {
                entry
                    .name_value
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

// --- AlienVault OTX ---

#[derive(Debug, Deserialize)]
struct OtxPassiveDns {
    #[serde(default)]
    passive_dns: Vec<OtxRecord>,
}

#[derive(Debug, Deserialize)]
struct OtxRecord {
    hostname: Option<String>,
}

/// Passive-DNS history from AlienVault OTX.
pub struct AlienVaultOtx {
    base_url: String,
}

impl AlienVaultOtx {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

#[async_trait]
impl SubdomainSource for AlienVaultOtx {
    fn name(&self) -> &'static str {
        "alienvault-otx"
    }

    async fn query(&self, client: &Client, domain: &str) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/api/v1/indicators/domain/{}/passive_dns",
            self.base_url.trim_end_matches('/'),
            domain
        );
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }
        let body: OtxPassiveDns = response.json().await?;
        Ok(body.passive_dns.into_iter().filter_map(|r| r.hostname).collect())
    }
}

// --- Aggregator ---

/// Fans out to every configured source and merges what comes back.
pub struct SubdomainAggregator {
    client: Client,
    sources: Vec<Box<dyn SubdomainSource>>,
    source_timeout: Duration,
}

impl SubdomainAggregator {
    pub fn new(client: Client, sources: Vec<Box<dyn SubdomainSource>>, source_timeout: Duration) -> Self {
        Self { client, sources, source_timeout }
    }

    /// Queries all sources concurrently, each under its own timeout.
    ///
    /// A failing or slow source is recorded as degraded and contributes nothing;
    /// the others are unaffected. Merging happens only after every source settled.
    ///
    /// # Arguments
    ///
    /// * `domain` - The registrable domain to enumerate (e.g., "example.com"). It is
    ///   trimmed and lowercased before any source sees it.
    ///
    /// # Returns
    ///
    /// A `SubdomainReport` with the deduplicated, ascending in-scope hostnames and one
    /// `SourceOutcome` per source, in source order. Never fails as a whole: with every
    /// source degraded the report is simply empty.
    pub async fn enumerate(&self, domain: &str) -> SubdomainReport {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        info!(domain = %domain, sources = self.sources.len(), "Starting subdomain enumeration.");

        // Fan out: one query per source, each wrapped in its own timeout so a slow
        // source cannot hold the others back.
        let calls = self.sources.iter().map(|source| {
            let domain = domain.as_str();
            async move {
                let result = match timeout(self.source_timeout, source.query(&self.client, domain)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout(self.source_timeout)),
                };
                (source.name(), result)
            }
        });
        let results = join_all(calls).await;

        // Fan in: every source has settled, merge in source order.
        let mut report = SubdomainReport { domain: domain.clone(), ..Default::default() };
        for (name, result) in results {
            let status = match result {
                Ok(records) => {
                    let found = filter_in_scope(&domain, records);
                    debug!(source = name, found = found.len(), "Source answered.");
                    let count = found.len();
                    report.hosts.extend(found);
                    SourceStatus::Answered(count)
                }
                Err(e) => {
                    warn!(source = name, domain = %domain, error = %e, "Source degraded.");
                    SourceStatus::Degraded(e.to_string())
                }
            };
            report.sources.push(SourceOutcome { source: name.to_string(), status });
        }

        info!(
            domain = %domain,
            hosts = report.count(),
            degraded = report.degraded_sources().count(),
            "Subdomain enumeration finished."
        );
        report
    }
}

/// Keeps records that are strict subdomains of `domain`, lowercased and deduplicated.
///
/// A leading wildcard label (`*.`) from certificate names is stripped first.
///
/// # Arguments
///
/// * `domain` - The apex domain that defines the scope.
/// * `records` - Raw hostnames as a source returned them, possibly with trailing dots,
///   mixed case or surrounding whitespace.
///
/// # Returns
///
/// The ascending set of hostnames ending in `.<domain>`. The apex itself and lookalikes
/// such as `badexample.com` are dropped.
pub fn filter_in_scope<I, S>(domain: &str, records: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let suffix = format!(".{}", domain.to_lowercase());
    records
        .into_iter()
        .filter_map(|record| {
            let host = record.as_ref().trim().trim_end_matches('.').to_lowercase();
            let host = host.strip_prefix("*.").map(str::to_string).unwrap_or(host);
            (host.len() > suffix.len() && host.ends_with(&suffix)).then_some(host)
        })
        .collect()
}
