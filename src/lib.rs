//! # resolvenet
//!
//! An HTTP/HTTPS client whose address lookup can be swapped out per client.
//!
//! A custom [`Resolve`](dns::Resolve) implementation decides which IP a
//! request dials. The URL itself is never rewritten: the `Host` header, TLS
//! SNI and certificate hostname verification all keep the original hostname.
//!
//! ## Features
//!
//! - **Pluggable DNS**: system, hickory (system config or Google Public DNS),
//!   round-robin over a host's addresses, and static overrides
//! - **HTTP/1.1 & HTTP/2**: negotiated over ALPN on BoringSSL
//! - **Single-shot transactions**: no redirects followed, no retries
//! - **Timeouts**: separate connect and read limits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resolvenet::dns::{HickoryResolver, RoundRobinResolver};
//! use resolvenet::Client;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = RoundRobinResolver::new(Arc::new(HickoryResolver::google()));
//!     let client = Client::builder().dns_resolver(Arc::new(resolver)).build();
//!     let response = client
//!         .get("https://www.googleapis.com/auth/calendar")
//!         .send()
//!         .await
//!         .unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`client`] - Client and request builders
//! - [`dns`] - Resolver trait and implementations
//! - [`http`] - Transactions, headers, and body handling
//! - [`socket`] - Connection targets, TCP/TLS connect

pub mod base;
pub mod client;
pub mod dns;
pub mod http;
pub mod socket;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder, Timeouts};
pub use crate::http::{HttpNetworkTransaction, HttpResponse, RequestBody, RequestContent};
