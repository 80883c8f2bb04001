//! Socket and connection management.
//!
//! Mirrors the parts of Chromium's `net/socket/` needed to dial one request:
//! - [`target`]: where to dial vs. which host the request is for
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`client`]: the connected TCP or TLS socket
//! - [`tls`]: TLS configuration with BoringSSL

pub mod client;
pub mod connectjob;
pub mod target;
pub mod tls;

pub use target::{ConnectionTarget, Scheme};
pub use tls::TlsConfig;
