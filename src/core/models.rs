// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;

// --- Reusable Result Types ---

// A custom type alias for a Result that can hold an optional success value or a String error.
// `Ok(None)` means the lookup worked but the field was absent, `Err` means the lookup itself failed.
pub type ScanResult<T> = Result<Option<T>, String>;

// --- Subdomain Aggregator Models ---

// How a single enumeration source fared during one fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceStatus {
    /// The source answered; the number of in-scope hostnames it contributed.
    Answered(usize),
    /// The source failed or timed out and contributed nothing.
    Degraded(String),
}

// Per-source bookkeeping, kept for logging and tests. Never rendered raw to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: String,
    pub status: SourceStatus,
}

impl SourceOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, SourceStatus::Degraded(_))
    }
}

// The merged result of every source for one domain.
// `hosts` is a BTreeSet so iteration is always ascending and duplicate-free.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubdomainReport {
    pub domain: String,
    pub hosts: BTreeSet<String>,
    pub sources: Vec<SourceOutcome>,
}

impl SubdomainReport {
    pub fn count(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Newline-joined hostnames in ascending order.
    pub fn to_text(&self) -> String {
        self.hosts.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn degraded_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| s.is_degraded())
    }
}

// --- Port Prober Models ---

// Open ports found on one address, ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortScanReport {
    pub address: IpAddr,
    pub open_ports: Vec<u16>,
}

impl PortScanReport {
    pub fn has_open_ports(&self) -> bool {
        !self.open_ports.is_empty()
    }
}

// --- Info Aggregator Models ---

// Fields returned by the metadata/geo endpoint. Every field is optional upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpMetadata {
    pub ip: Option<String>,
    pub org: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub hostname: Option<String>,
}

// The aggregate record for the info tool.
// Each field carries its own failure so a broken sub-lookup never hides the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub target: String,
    pub address: IpAddr,
    pub org: ScanResult<String>,
    pub country: ScanResult<String>,
    pub city: ScanResult<String>,
    pub hostname: ScanResult<String>,
    pub server: ScanResult<String>,
}

impl HostInfo {
    /// Spreads one metadata lookup over the per-field results.
    pub fn new(
        target: &str,
        address: IpAddr,
        metadata: Result<IpMetadata, String>,
        server: ScanResult<String>,
    ) -> Self {
        Self {
            target: target.to_string(),
            address,
            org: metadata_field(&metadata, |m| m.org.clone()),
            country: metadata_field(&metadata, |m| m.country.clone()),
            city: metadata_field(&metadata, |m| m.city.clone()),
            hostname: metadata_field(&metadata, |m| m.hostname.clone()),
            server,
        }
    }
}

fn metadata_field(
    metadata: &Result<IpMetadata, String>,
    pick: impl Fn(&IpMetadata) -> Option<String>,
) -> ScanResult<String> {
    match metadata {
        Ok(meta) => Ok(pick(meta).filter(|v| !v.is_empty())),
        Err(e) => Err(e.clone()),
    }
}
