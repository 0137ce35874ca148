// src/core/target.rs

use crate::errors::InputError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::net::IpAddr;
use url::{Host, Url};

static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9])?\.)*[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$")
        .expect("hostname pattern is valid")
});

const MAX_HOSTNAME_LEN: usize = 253;

/// A normalized tool argument: a lowercase hostname or an IP literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Host(String),
    Ip(IpAddr),
}

impl Target {
    /// Parses free user input into a target.
    ///
    /// Accepts bare hosts, IP literals and full URLs; the scheme, port and
    /// path of a URL are dropped the same way the scan input box does it.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InputError::Missing);
        }

        if let Ok(ip) = raw.parse::<IpAddr>() {
            return Ok(Target::Ip(ip));
        }

        let with_scheme = if !raw.starts_with("http://") && !raw.starts_with("https://") {
            format!("https://{}", raw)
        } else {
            raw.to_string()
        };

        let url = Url::parse(&with_scheme).map_err(|_| InputError::Invalid(raw.to_string()))?;
        match url.host() {
            Some(Host::Ipv4(ip)) => Ok(Target::Ip(IpAddr::V4(ip))),
            Some(Host::Ipv6(ip)) => Ok(Target::Ip(IpAddr::V6(ip))),
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.').to_lowercase();
                if domain.len() <= MAX_HOSTNAME_LEN && RE_HOSTNAME.is_match(&domain) {
                    Ok(Target::Host(domain))
                } else {
                    Err(InputError::Invalid(raw.to_string()))
                }
            }
            None => Err(InputError::Invalid(raw.to_string())),
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            Target::Ip(ip) => Some(*ip),
            Target::Host(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Host(host) => write!(f, "{}", host),
            Target::Ip(ip) => write!(f, "{}", ip),
        }
    }
}
