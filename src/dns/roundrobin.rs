//! Round-robin DNS resolution.
//!
//! Spreads connections across every address a hostname has by returning a
//! single address per lookup and advancing a per-host cursor each time.

use super::resolve::not_resolved;
use super::{Addrs, Name, Resolve, Resolving};
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Default cap on per-host cursors kept by one resolver.
pub const DEFAULT_MAX_TRACKED_HOSTS: usize = 4096;

enum Source {
    Static(HashMap<Name, Vec<IpAddr>>),
    Dynamic(Arc<dyn Resolve>),
}

/// Resolver that hands out a host's addresses in rotation.
///
/// Addresses come either from a fixed table ([`from_static`]) or from an
/// inner resolver queried on every call ([`new`]). Dynamic results are
/// sorted and deduplicated before picking, so the rotation stays stable
/// even when the upstream server shuffles its answers.
///
/// Cursors are kept per hostname and advanced atomically, so a single
/// instance can be shared by concurrent requests. At most
/// [`DEFAULT_MAX_TRACKED_HOSTS`] cursors are kept (see
/// [`with_max_tracked_hosts`]); when a new host would exceed the cap, an
/// existing cursor is evicted and that host restarts at its first address.
///
/// [`from_static`]: RoundRobinResolver::from_static
/// [`new`]: RoundRobinResolver::new
/// [`with_max_tracked_hosts`]: RoundRobinResolver::with_max_tracked_hosts
///
/// # Example
///
/// ```rust,ignore
/// use resolvenet::dns::{HickoryResolver, RoundRobinResolver};
/// use std::sync::Arc;
///
/// let resolver = RoundRobinResolver::new(Arc::new(HickoryResolver::google()));
/// ```
pub struct RoundRobinResolver {
    source: Arc<Source>,
    cursors: Arc<DashMap<Name, AtomicUsize>>,
    max_tracked_hosts: usize,
}

impl RoundRobinResolver {
    /// Rotates through the addresses returned by `inner` for each lookup.
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self::with_source(Source::Dynamic(inner))
    }

    /// Rotates through a pre-configured address table.
    ///
    /// Hosts missing from the table, or mapped to an empty list, fail to
    /// resolve.
    pub fn from_static<I, N>(table: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<IpAddr>)>,
        N: Into<Name>,
    {
        let table = table.into_iter().map(|(n, ips)| (n.into(), ips)).collect();
        Self::with_source(Source::Static(table))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source: Arc::new(source),
            cursors: Arc::new(DashMap::new()),
            max_tracked_hosts: DEFAULT_MAX_TRACKED_HOSTS,
        }
    }

    /// Caps how many hostnames keep a rotation cursor. Zero is treated as one.
    pub fn with_max_tracked_hosts(mut self, max: usize) -> Self {
        self.max_tracked_hosts = max.max(1);
        self
    }

    /// Number of hostnames that have been resolved at least once.
    pub fn tracked_hosts(&self) -> usize {
        self.cursors.len()
    }
}

fn next_index(
    cursors: &DashMap<Name, AtomicUsize>,
    name: &Name,
    len: usize,
    max_tracked_hosts: usize,
) -> usize {
    if let Some(cursor) = cursors.get(name) {
        return cursor.fetch_add(1, Ordering::Relaxed) % len;
    }
    while cursors.len() >= max_tracked_hosts {
        let Some(victim) = cursors.iter().next().map(|e| e.key().clone()) else {
            break;
        };
        tracing::debug!(domain = %victim, "evicting round-robin cursor");
        cursors.remove(&victim);
    }
    cursors
        .entry(name.clone())
        .or_insert_with(|| AtomicUsize::new(0))
        .fetch_add(1, Ordering::Relaxed)
        % len
}

impl Resolve for RoundRobinResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let source = self.source.clone();
        let cursors = self.cursors.clone();
        let max_tracked_hosts = self.max_tracked_hosts;

        Box::pin(async move {
            let ips: Vec<IpAddr> = match &*source {
                Source::Static(table) => table.get(&name).cloned().unwrap_or_default(),
                Source::Dynamic(inner) => {
                    let mut ips: Vec<IpAddr> =
                        inner.resolve(name.clone()).await?.map(|a| a.ip()).collect();
                    ips.sort();
                    ips.dedup();
                    ips
                }
            };

            if ips.is_empty() {
                return Err(not_resolved(name.as_str(), "no addresses to rotate through"));
            }

            let ip = ips[next_index(&cursors, &name, ips.len(), max_tracked_hosts)];
            tracing::debug!(domain = %name, %ip, candidates = ips.len(), "round-robin pick");
            Ok(Box::new(std::iter::once(SocketAddr::new(ip, 0))) as Addrs)
        })
    }
}

impl fmt::Debug for RoundRobinResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &*self.source {
            Source::Static(table) => format!("static({} hosts)", table.len()),
            Source::Dynamic(_) => "dynamic".to_string(),
        };
        f.debug_struct("RoundRobinResolver")
            .field("source", &source)
            .field("tracked_hosts", &self.cursors.len())
            .finish()
    }
}
