// src/core/scanner/resolver.rs

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use std::net::IpAddr;
use tracing::{debug, info, warn};

use crate::core::target::Target;
use crate::errors::ResolveError;

/// Turns a name into a single address.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<IpAddr, ResolveError>;
}

/// DNS-backed resolver. Prefers the first IPv4 address, like `gethostbyname`.
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Uses the system resolver configuration, falling back to public defaults
    /// when it cannot be read.
    pub fn from_system() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!(error = %e, "Could not read system resolver configuration, using defaults.");
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self { resolver }
    }
}

/// Splits resolver errors into "the name has no address", a normal outcome, and
/// everything else, which is a fault of the resolver itself.
///
/// # Arguments
///
/// * `name` - The name that was looked up, kept for the `NotFound` message.
/// * `error` - The error returned by `hickory-resolver`.
///
/// # Returns
///
/// `ResolveError::NotFound` for an empty or NXDOMAIN answer, `ResolveError::Resolver`
/// for timeouts, unreachable servers and protocol errors.
pub fn classify(name: &str, error: hickory_resolver::error::ResolveError) -> ResolveError {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => {
            info!(name, "Name does not exist.");
            ResolveError::NotFound(name.to_string())
        }
        _ => {
            warn!(name, error = %error, "Resolver failure.");
            ResolveError::Resolver(error)
        }
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn resolve(&self, name: &str) -> Result<IpAddr, ResolveError> {
        if let Ok(Target::Ip(ip)) = Target::parse(name) {
            return Ok(ip);
        }

        debug!(name, "Resolving host.");
        let lookup = self
            .resolver
            .lookup_ip(name)
            .await
            .map_err(|e| classify(name, e))?;

        let addresses: Vec<IpAddr> = lookup.iter().collect();
        let address = addresses
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addresses.first())
            .copied()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

        info!(name, %address, "Resolved host.");
        Ok(address)
    }
}
