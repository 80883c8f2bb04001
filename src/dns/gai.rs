//! System DNS resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native DNS resolution via
//! `getaddrinfo`, executed on tokio's blocking pool so the lookup does not
//! stall the async runtime.
//!
//! Requests built without a resolver get the same OS resolution implicitly
//! from the connect job; configure `GaiResolver` explicitly when it should
//! sit underneath a wrapping resolver such as
//! [`RoundRobinResolver`](super::RoundRobinResolver).

use super::resolve::not_resolved;
use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

/// System DNS resolver using `getaddrinfo` in a thread pool.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let domain = name.as_str().to_string();

            // IP literals never hit getaddrinfo.
            if let Ok(ip) = domain.parse::<IpAddr>() {
                return Ok(Box::new(std::iter::once(SocketAddr::new(ip, 0))) as Addrs);
            }

            let host = domain.clone();
            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await;

            let addrs = result
                .map_err(|e| {
                    tracing::error!(error = %e, "DNS resolution task failed");
                    NetError::NameNotResolved
                })?
                .map_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "DNS resolution failed");
                    NetError::NameNotResolvedFor {
                        domain: domain.clone(),
                        source: Arc::new(e),
                    }
                })?;

            if addrs.is_empty() {
                return Err(not_resolved(&domain, "No addresses returned by getaddrinfo"));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "DNS resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_gai_resolver_ip_literal() {
        let resolver = GaiResolver::new();
        let addrs: Vec<_> = resolver
            .resolve(Name::new("203.0.113.5"))
            .await
            .unwrap()
            .collect();

        assert_eq!(
            addrs,
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 0)]
        );
    }

    #[tokio::test]
    async fn test_gai_resolver_localhost() {
        let resolver = GaiResolver::new();
        let result = resolver.resolve(Name::new("localhost")).await;

        // localhost should always resolve
        assert!(result.is_ok());
        let addrs: Vec<_> = result.unwrap().collect();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|a| a.port() == 0));
    }
}
