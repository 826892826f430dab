use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::{Host, Url};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("URL must have a host")]
    MissingHost,
    #[error("Local addresses not allowed: {0}")]
    LocalAddress(String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Rules a URL must satisfy before the service will fetch it.
///
/// Only `http` and `https` are accepted and the URL must carry a host.
/// Loopback, private, shared (CGNAT) and link-local targets are refused
/// unless `allow_private_hosts` is set. This only sees the URL text; the
/// fetcher also checks redirect hops and resolved addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlPolicy {
    pub allow_private_hosts: bool,
}

impl UrlPolicy {
    pub fn new(allow_private_hosts: bool) -> Self {
        Self {
            allow_private_hosts,
        }
    }

    pub fn validate(&self, url_str: &str) -> Result<Url, ValidationError> {
        let url_str = url_str.trim();
        if url_str.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let url =
            Url::parse(url_str).map_err(|_| ValidationError::MalformedUrl(url_str.to_string()))?;
        self.check(&url)?;
        Ok(url)
    }

    pub fn check(&self, url: &Url) -> Result<(), ValidationError> {
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(ValidationError::UnsupportedScheme(scheme.to_string())),
        }

        let host = url.host().ok_or(ValidationError::MissingHost)?;
        if let Host::Domain(domain) = host {
            if domain.is_empty() {
                return Err(ValidationError::MissingHost);
            }
        }

        if !self.allow_private_hosts && is_private_host(&host) {
            return Err(ValidationError::LocalAddress(host.to_string()));
        }

        Ok(())
    }
}

pub fn validate_url(url_str: &str) -> Result<Url, ValidationError> {
    UrlPolicy::default().validate(url_str)
}

pub fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(addr) => is_private_ipv4(addr),
        Host::Ipv6(addr) => is_private_ipv6(addr),
    }
}

pub fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

pub fn is_private_ipv4(addr: &Ipv4Addr) -> bool {
    let [first, second, ..] = addr.octets();
    addr.is_loopback()
        || addr.is_private()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast()
        // 0.0.0.0/8 "this network"
        || first == 0
        // 100.64.0.0/10 shared address space
        || (first == 100 && (second & 0xc0) == 64)
}

pub fn is_private_ipv6(addr: &Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        || addr.to_ipv4_mapped().is_some_and(|v4| is_private_ipv4(&v4))
}
