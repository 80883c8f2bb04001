//! HTTP Client with builder pattern.
//!
//! A [`Client`] carries the settings shared by every request it makes: an
//! optional custom DNS resolver, TLS configuration and default timeouts.
//! Each call produces a fresh [`HttpNetworkTransaction`] over a fresh
//! connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use resolvenet::dns::{HickoryResolver, RoundRobinResolver};
//! use resolvenet::Client;
//! use std::sync::Arc;
//!
//! let client = Client::builder()
//!     .dns_resolver(Arc::new(RoundRobinResolver::new(Arc::new(HickoryResolver::google()))))
//!     .build();
//!
//! let resp = client.get("https://www.example.com/data")
//!     .send()
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::dns::Resolve;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::{RequestBody, RequestContent};
use crate::http::response::HttpResponse;
use crate::http::transaction::HttpNetworkTransaction;
use crate::socket::target::effective_port;
use crate::socket::tls::TlsConfig;
use http::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Connect and read limits. A zero duration means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Bounds TCP connect plus the TLS and HTTP handshakes.
    pub connect: Duration,
    /// Bounds the wait for response headers and for each body chunk.
    pub read: Duration,
}

impl Timeouts {
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }
}

/// HTTP Client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client. Cloning is
/// cheap; clones share the resolver and TLS configuration.
#[derive(Clone, Default)]
pub struct Client {
    resolver: Option<Arc<dyn Resolve>>,
    tls: Arc<TlsConfig>,
    timeouts: Timeouts,
}

impl Client {
    /// Create a new client with default settings: system resolution, TLS
    /// 1.2+ with peer verification, and no timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn has_custom_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn tls_config(&self) -> &TlsConfig {
        &self.tls
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a PATCH request.
    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: OrderedHeaderMap::new(),
            content: None,
            timeouts: self.timeouts,
            error: None,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("custom_resolver", &self.resolver.is_some())
            .field("tls", &self.tls)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    resolver: Option<Arc<dyn Resolve>>,
    tls: Option<TlsConfig>,
    timeouts: Timeouts,
}

impl ClientBuilder {
    /// Route every request's address lookup through `resolver`.
    ///
    /// The URL, Host header and TLS server name are unaffected; only the
    /// dialed address changes. Lookup failures fail the request.
    ///
    /// Only the first address the resolver yields is dialed, with no fallback
    /// to the rest. A resolver that lists an IPv6 address first therefore
    /// fails against an IPv4-only server; wrap it in a
    /// [`RoundRobinResolver`](crate::dns::RoundRobinResolver) or filter its
    /// answers to pick the family.
    pub fn dns_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn tls_config(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read = timeout;
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        Client {
            resolver: self.resolver,
            tls: Arc::new(self.tls.unwrap_or_default()),
            timeouts: self.timeouts,
        }
    }
}

/// Builder for a single request.
///
/// Invalid input is remembered and reported by [`build`](Self::build) or
/// [`send`](Self::send).
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: OrderedHeaderMap,
    content: Option<RequestContent>,
    timeouts: Timeouts,
    error: Option<NetError>,
}

impl RequestBuilder {
    /// Add a header. Adding the same name twice sends both fields.
    pub fn header<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.headers.append(key.as_ref(), value.as_ref()) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Set request body.
    pub fn body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.content = Some(RequestContent::new(body));
        self
    }

    /// Set body together with its length, type and encoding.
    pub fn content(mut self, content: RequestContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Set JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.content =
                    Some(RequestContent::new(bytes).with_content_type("application/json"));
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to serialize request body");
                self.error.get_or_insert(NetError::JsonParseError);
            }
        }
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read = timeout;
        self
    }

    /// Assemble the transaction without running it.
    pub fn build(self) -> Result<HttpNetworkTransaction, NetError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let url = Url::parse(&self.url).map_err(|_| NetError::InvalidUrl)?;
        effective_port(&url)?;

        let mut transaction = HttpNetworkTransaction::new(self.method, url, self.client.tls);
        transaction.set_headers(self.headers);
        transaction.set_timeout(self.timeouts.connect, self.timeouts.read);
        if let Some(content) = self.content {
            transaction.set_content(content);
        }
        if let Some(resolver) = self.client.resolver {
            transaction.set_resolver(resolver);
        }
        Ok(transaction)
    }

    /// Send the request.
    pub async fn send(self) -> Result<HttpResponse, NetError> {
        self.build()?.execute().await
    }
}
