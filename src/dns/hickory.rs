//! Async DNS resolver using hickory-dns.
//!
//! Unlike `GaiResolver`, this resolver is fully async and talks to name
//! servers directly. It is the usual address source for
//! [`RoundRobinResolver`](super::RoundRobinResolver): every query returns the
//! full record set, which the round-robin layer then rotates through.

use super::resolve::not_resolved;
use super::{Addrs, Name, Resolve, Resolving};
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{
    net::SocketAddr,
    sync::{Arc, LazyLock},
};

/// Async DNS resolver backed by hickory-dns.
///
/// # Example
///
/// ```rust,ignore
/// use resolvenet::dns::{HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::google();
/// let addrs = resolver.resolve(Name::new("example.com")).await?;
/// ```
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
}

impl HickoryResolver {
    /// Creates a resolver using the system DNS configuration.
    ///
    /// The underlying resolver is shared process-wide and initialized on
    /// first use. If the system configuration cannot be read it falls back
    /// to hickory's defaults.
    pub fn new() -> Self {
        static SYSTEM: LazyLock<Arc<TokioResolver>> = LazyLock::new(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };
            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
            Arc::new(builder.build())
        });

        Self {
            resolver: SYSTEM.clone(),
        }
    }

    /// Creates a resolver that queries Google Public DNS (8.8.8.8 / 8.8.4.4).
    pub fn google() -> Self {
        Self::with_config(ResolverConfig::google())
    }

    /// Creates a resolver for an explicit upstream configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Self {
            resolver: Arc::new(builder.build()),
        }
    }
}

impl std::fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryResolver").finish_non_exhaustive()
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via hickory-dns");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                not_resolved(domain, e.to_string())
            })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();

            if addrs.is_empty() {
                return Err(not_resolved(domain, "No addresses returned"));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "hickory-dns resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::NetError;

    #[tokio::test]
    async fn test_system_resolver_is_shared() {
        let r1 = HickoryResolver::new();
        let r2 = HickoryResolver::new();
        assert!(Arc::ptr_eq(&r1.resolver, &r2.resolver));
    }

    #[tokio::test]
    async fn test_google_resolver_is_independent() {
        let system = HickoryResolver::new();
        let google = HickoryResolver::google();
        assert!(!Arc::ptr_eq(&system.resolver, &google.resolver));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_hickory_resolver_invalid_domain() {
        let resolver = HickoryResolver::google();
        let result = resolver
            .resolve(Name::new("this-domain-definitely-does-not-exist.invalid"))
            .await;

        match result.err().expect("Should have error") {
            NetError::NameNotResolvedFor { domain, .. } => {
                assert_eq!(domain, "this-domain-definitely-does-not-exist.invalid");
            }
            other => panic!("Unexpected error type: {other:?}"),
        }
    }
}
