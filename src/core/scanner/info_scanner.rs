// src/core/scanner/info_scanner.rs

use reqwest::Client;
use reqwest::header::SERVER;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::models::{HostInfo, IpMetadata, ScanResult};
use crate::core::scanner::resolver::Resolve;
use crate::errors::ResolveError;

pub const IPINFO_BASE_URL: &str = "https://ipinfo.io";

/// Redirects followed by the header probe before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Default budget for the metadata lookup and the header probe, each.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Combines resolution, a metadata/geo lookup and a `Server` header probe.
pub struct InfoScanner {
    client: Client,
    metadata_base_url: String,
    request_timeout: Duration,
}

impl InfoScanner {
    pub fn new(client: Client, metadata_base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client,
            metadata_base_url: metadata_base_url.into(),
            request_timeout,
        }
    }

    /// Builds the record for `target`.
    ///
    /// Resolution failure aborts with the resolver's error. After that the two
    /// sub-lookups run concurrently and each one failing only marks its own
    /// fields unavailable.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Turns `target` into the address the metadata lookup is keyed by.
    /// * `target` - A normalized hostname or IP literal (e.g., "example.com", "::1").
    ///
    /// # Returns
    ///
    /// `Ok(HostInfo)` once the name resolved, whatever the sub-lookups did, or the
    /// resolver's `ResolveError` untouched.
    pub async fn describe(&self, resolver: &dyn Resolve, target: &str) -> Result<HostInfo, ResolveError> {
        info!(target, "Starting info scan.");
        let address = resolver.resolve(target).await?;

        // Both sub-lookups are independent once the address is known.
        let url = probe_url(target);
        let (metadata, server) = tokio::join!(
            self.lookup_metadata(address),
            fetch_server_header(&self.client, &url, self.request_timeout)
        );

        let record = HostInfo::new(target, address, metadata, server);
        info!(target, %address, "Info scan finished.");
        Ok(record)
    }

    /// Fetches organisation and location data keyed by `address`.
    pub async fn lookup_metadata(&self, address: IpAddr) -> Result<IpMetadata, String> {
        let url = format!("{}/{}/json", self.metadata_base_url.trim_end_matches('/'), address);
        debug!(url = %url, "Looking up address metadata.");

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(%address, error = %e, "Metadata request failed.");
                format!("Metadata request failed: {}", e)
            })?;

        if !response.status().is_success() {
            warn!(%address, status = %response.status(), "Metadata lookup returned an error status.");
            return Err(format!("Metadata lookup returned {}", response.status()));
        }

        response.json::<IpMetadata>().await.map_err(|e| {
            warn!(%address, error = %e, "Metadata response could not be decoded.");
            format!("Invalid metadata response: {}", e)
        })
    }
}

/// The URL the header probe requests for `target`. IPv6 literals are bracketed.
pub fn probe_url(target: &str) -> String {
    match target.parse::<IpAddr>() {
        Ok(IpAddr::V6(ip)) => format!("https://[{}]", ip),
        _ => format!("https://{}", target),
    }
}

/// Returns the `Server` header of `url`, following a bounded number of redirects.
///
/// The body is never read.
///
/// # Arguments
///
/// * `client` - The shared client; its redirect policy bounds how far the probe follows.
/// * `url` - The absolute URL to request with `HEAD`.
/// * `request_timeout` - Budget for the whole request, redirects included.
///
/// # Returns
///
/// A `ScanResult<String>`: `Ok(Some(value))` when the header is present, `Ok(None)` when
/// the response carried no such header, and `Err` when no response arrived at all.
pub async fn fetch_server_header(client: &Client, url: &str, request_timeout: Duration) -> ScanResult<String> {
    debug!(url, "Probing server header.");
    let response = match client.head(url).timeout(request_timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            error!(url, error = %e, "Header probe failed.");
            return Err(format!("HTTP request failed: {}", e));
        }
    };

    debug!(url, status = %response.status(), "Received header probe response.");
    match response.headers().get(SERVER) {
        Some(value) => match value.to_str() {
            Ok(s) => Ok(Some(s.to_string())),
            Err(_) => {
                warn!(url, "Server header contained invalid UTF-8.");
                Ok(Some("[Invalid UTF-8]".to_string()))
            }
        },
        None => Ok(None),
    }
}
