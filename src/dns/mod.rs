//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution for outbound requests:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver (system config or Google Public DNS)
//! - Round-robin selection across a host's addresses
//! - Hostname-to-IP override mechanism
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction. A resolver is configured once
//! on a [`Client`](crate::client::Client); when present, requests dial the
//! address it returns while the URL, Host header and TLS server name keep
//! the original hostname. Without one, the connect job falls back to the
//! operating system's resolution of the URL host.
//!
//! # Example
//!
//! ```rust,ignore
//! use resolvenet::dns::{HickoryResolver, Name, Resolve, RoundRobinResolver};
//! use std::sync::Arc;
//!
//! let resolver = RoundRobinResolver::new(Arc::new(HickoryResolver::google()));
//! let addr = resolver.resolve(Name::new("example.com")).await?.next();
//! ```

mod gai;
mod hickory;
mod resolve;
mod roundrobin;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
pub(crate) use resolve::not_resolved;
pub use roundrobin::{RoundRobinResolver, DEFAULT_MAX_TRACKED_HOSTS};
