//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve` trait and supporting types that form
//! the foundation of the DNS abstraction layer.

use crate::base::neterror::NetError;
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    io,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

/// A domain name to resolve into IP addresses.
///
/// Names compare case-insensitively: the host is stored in ASCII lowercase
/// with any trailing root dot removed.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    pub fn new(host: impl AsRef<str>) -> Self {
        let host = host.as_ref().trim_end_matches('.').to_ascii_lowercase();
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// Trait for DNS resolution.
///
/// Implementations must be thread-safe: a single resolver is configured on a
/// [`Client`](crate::client::Client) and shared by every request it builds.
///
/// A resolver that cannot produce any address must fail with
/// [`NetError::NameNotResolvedFor`] rather than yield an empty iterator.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to IP addresses.
    ///
    /// The returned addresses will have port 0; callers should set the
    /// appropriate port based on the target service.
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Builds the error returned when a lookup produced nothing.
pub(crate) fn not_resolved(domain: &str, reason: impl Into<String>) -> NetError {
    NetError::NameNotResolvedFor {
        domain: domain.to_string(),
        source: Arc::new(io::Error::new(io::ErrorKind::NotFound, reason.into())),
    }
}

/// DNS resolver wrapper that supports hostname overrides.
///
/// This resolver first checks a map of hostname-to-address overrides before
/// falling back to the underlying resolver. Useful for:
/// - Testing without real DNS
/// - Pinning specific IPs for certain domains
///
/// # Example
///
/// ```rust,ignore
/// use resolvenet::dns::{DnsResolverWithOverrides, GaiResolver};
/// use std::sync::Arc;
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()))
///     .with_override("api.local", vec!["127.0.0.1".parse().unwrap()]);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: HashMap<Name, Vec<IpAddr>>,
}

impl DnsResolverWithOverrides {
    /// Creates a resolver with no overrides that defers to `inner`.
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self {
            inner,
            overrides: HashMap::new(),
        }
    }

    /// Pins `host` to `addrs`, bypassing the inner resolver for it.
    pub fn with_override(mut self, host: impl Into<Name>, addrs: Vec<IpAddr>) -> Self {
        self.overrides.insert(host.into(), addrs);
        self
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(ips) = self.overrides.get(&name) {
            let result = if ips.is_empty() {
                Err(not_resolved(name.as_str(), "override has no addresses"))
            } else {
                tracing::debug!(domain = %name, count = ips.len(), "using DNS override");
                let addrs: Vec<SocketAddr> = ips.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
                Ok(Box::new(addrs.into_iter()) as Addrs)
            };
            return Box::pin(std::future::ready(result));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
