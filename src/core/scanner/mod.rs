// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the individual engines and the `Recon` facade the bot talks to.
pub mod info_scanner;
pub mod port_scanner;
pub mod resolver;
pub mod subdomain_scanner;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::core::models::{HostInfo, PortScanReport, SubdomainReport};
use crate::errors::ResolveError;

use self::info_scanner::{InfoScanner, MAX_REDIRECTS};
use self::port_scanner::run_port_scan;
use self::resolver::{DnsResolver, Resolve};
use self::subdomain_scanner::{AlienVaultOtx, CrtSh, SubdomainAggregator};

/// Everything the chat layer can ask the engine to do.
#[async_trait]
pub trait Recon: Send + Sync {
    /// Subdomains of `domain` from every source. Degraded sources only shrink the result.
    async fn enumerate(&self, domain: &str) -> SubdomainReport;

    /// One address for `name`. `ResolveError::NotFound` is a normal answer; any other
    /// error is a fault the caller must not present as "not found".
    async fn resolve(&self, name: &str) -> Result<IpAddr, ResolveError>;

    /// Resolution plus metadata and server header, each sub-lookup failing on its own.
    async fn describe(&self, target: &str) -> Result<HostInfo, ResolveError>;

    async fn probe(&self, address: IpAddr) -> PortScanReport;
}

/// The production engine: DNS resolver, subdomain aggregator, info scanner and port prober.
pub struct Scanner {
    resolver: Arc<dyn Resolve>,
    subdomains: SubdomainAggregator,
    info: InfoScanner,
    port_timeout: Duration,
}

impl Scanner {
    pub fn new(
        resolver: Arc<dyn Resolve>,
        subdomains: SubdomainAggregator,
        info: InfoScanner,
        port_timeout: Duration,
    ) -> Self {
        Self { resolver, subdomains, info, port_timeout }
    }

    /// Wires every engine from the runtime settings.
    ///
    /// One HTTP client is shared by the sources and the info scanner; each engine
    /// applies its own timeout per request.
    ///
    /// # Arguments
    ///
    /// * `settings` - Source and metadata base URLs plus the per-engine timeouts.
    ///
    /// # Returns
    ///
    /// The ready `Scanner`, or the `reqwest::Error` raised while building the client.
    pub fn from_settings(settings: &Settings) -> reqwest::Result<Self> {
        let client = build_client()?;
        let subdomains = SubdomainAggregator::new(
            client.clone(),
            vec![
                Box::new(CrtSh::new(&settings.crtsh_url)),
                Box::new(AlienVaultOtx::new(&settings.otx_url)),
            ],
            settings.source_timeout,
        );
        let info = InfoScanner::new(client, &settings.metadata_url, settings.http_timeout);
        Ok(Self::new(
            Arc::new(DnsResolver::from_system()),
            subdomains,
            info,
            settings.port_timeout,
        ))
    }
}

/// Shared HTTP client. Timeouts are set per call since the budgets differ by source.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("VanguardRecon/", env!("CARGO_PKG_VERSION")))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
}

#[async_trait]
impl Recon for Scanner {
    async fn enumerate(&self, domain: &str) -> SubdomainReport {
        self.subdomains.enumerate(domain).await
    }

    async fn resolve(&self, name: &str) -> Result<IpAddr, ResolveError> {
        self.resolver.resolve(name).await
    }

    async fn describe(&self, target: &str) -> Result<HostInfo, ResolveError> {
        self.info.describe(self.resolver.as_ref(), target).await
    }

    async fn probe(&self, address: IpAddr) -> PortScanReport {
        run_port_scan(address, self.port_timeout).await
    }
}
