//! Single request/response execution.
//!
//! An `HttpNetworkTransaction` is built per call and consumed by
//! [`execute`](HttpNetworkTransaction::execute). It opens exactly one
//! connection, never retries and never follows redirects.

use crate::base::neterror::NetError;
use crate::dns::{not_resolved, Name, Resolve};
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::{OutgoingBody, RequestBody, RequestContent};
use crate::http::response::HttpResponse;
use crate::http::streamfactory::HttpStream;
use crate::socket::connectjob::{with_timeout, ConnectJob};
use crate::socket::target::ConnectionTarget;
use crate::socket::tls::TlsConfig;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{Method, Request, Version};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Whether `method` can carry an entity body.
///
/// GET, HEAD, DELETE, OPTIONS and TRACE cannot; every other method,
/// extension methods included, can.
pub fn method_supports_body(method: &Method) -> bool {
    !matches!(
        method.as_str(),
        "GET" | "HEAD" | "DELETE" | "OPTIONS" | "TRACE"
    )
}

pub struct HttpNetworkTransaction {
    method: Method,
    url: Url,
    request_headers: OrderedHeaderMap,
    content: Option<RequestContent>,
    connect_timeout: Duration,
    read_timeout: Duration,
    resolver: Option<Arc<dyn Resolve>>,
    tls: Arc<TlsConfig>,
}

impl HttpNetworkTransaction {
    pub fn new(method: Method, url: Url, tls: Arc<TlsConfig>) -> Self {
        Self {
            method,
            url,
            request_headers: OrderedHeaderMap::default(),
            content: None,
            connect_timeout: Duration::ZERO,
            read_timeout: Duration::ZERO,
            resolver: None,
            tls,
        }
    }

    /// Dial the address `resolver` returns instead of resolving the URL host.
    pub fn set_resolver(&mut self, resolver: Arc<dyn Resolve>) {
        self.resolver = Some(resolver);
    }

    /// Add a header field. Repeated calls with the same name send repeated
    /// fields.
    pub fn add_header(&mut self, key: &str, value: &str) -> Result<(), NetError> {
        self.request_headers.append(key, value)
    }

    /// Set a header, replacing any value already present.
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<(), NetError> {
        self.request_headers.insert(key, value)
    }

    pub fn set_headers(&mut self, headers: OrderedHeaderMap) {
        self.request_headers = headers;
    }

    /// Connect timeout bounds TCP connect and the TLS and HTTP handshakes.
    /// Read timeout bounds the wait for response headers and for each body
    /// chunk. Zero disables either limit.
    pub fn set_timeout(&mut self, connect_timeout: Duration, read_timeout: Duration) {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
    }

    pub fn set_content(&mut self, content: RequestContent) {
        self.content = Some(content);
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &OrderedHeaderMap {
        &self.request_headers
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Works out where the socket will be dialed.
    ///
    /// Without a resolver the target is the URL host itself. With one, the
    /// first address it returns is pinned while the logical host stays the
    /// URL host. Resolver failures propagate; there is no fallback to system
    /// resolution.
    pub async fn resolve_target(&self) -> Result<ConnectionTarget, NetError> {
        let target = ConnectionTarget::from_url(&self.url)?;
        let Some(resolver) = &self.resolver else {
            return Ok(target);
        };

        let name = Name::new(target.host());
        let addr = resolver
            .resolve(name.clone())
            .await?
            .next()
            .ok_or_else(|| not_resolved(name.as_str(), "resolver returned no addresses"))?;
        tracing::debug!(host = %name, ip = %addr.ip(), "custom resolver picked address");
        Ok(target.with_address(addr.ip()))
    }

    fn check_content(&self) -> Result<(), NetError> {
        if self.content.is_some() && !method_supports_body(&self.method) {
            return Err(NetError::UnsupportedBody {
                method: self.method.to_string(),
            });
        }
        Ok(())
    }

    fn build_request(
        &mut self,
        target: &ConnectionTarget,
        is_h2: bool,
    ) -> Result<Request<OutgoingBody>, NetError> {
        let mut headers = std::mem::take(&mut self.request_headers);

        // Host header (Only for H1). H2 carries the authority in the URI.
        if !is_h2 && !headers.contains(HOST.as_str()) {
            headers.insert(HOST.as_str(), &target.host_header())?;
        }

        let body = match self.content.take() {
            Some(content) => {
                if let Some(content_type) = &content.content_type {
                    headers.insert(CONTENT_TYPE.as_str(), content_type)?;
                }
                if let Some(encoding) = &content.content_encoding {
                    headers.insert(CONTENT_ENCODING.as_str(), encoding)?;
                }
                if let Some(len) = content.content_length() {
                    headers.insert(CONTENT_LENGTH.as_str(), &len.to_string())?;
                }
                content.body
            }
            None => RequestBody::Empty,
        };

        // H1 sends origin-form; H2 needs scheme and authority.
        let uri = if is_h2 {
            self.url.as_str().to_string()
        } else {
            match self.url.query() {
                Some(query) => format!("{}?{}", self.url.path(), query),
                None => self.url.path().to_string(),
            }
        };
        let version = if is_h2 {
            Version::HTTP_2
        } else {
            Version::HTTP_11
        };

        let mut req = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .version(version)
            .body(body.into_outgoing())
            .map_err(|_| NetError::InvalidUrl)?;
        *req.headers_mut() = headers.to_header_map();
        Ok(req)
    }

    /// Executes the request and returns the response with its body unread.
    pub async fn execute(mut self) -> Result<HttpResponse, NetError> {
        self.check_content()?;

        let target = self.resolve_target().await?;
        tracing::debug!(method = %self.method, url = %self.url, %target, "executing request");

        let tls = self.tls.clone();
        let mut stream = with_timeout(self.connect_timeout, NetError::ConnectionTimedOut, async {
            let socket = ConnectJob::connect(&target, &tls).await?;
            HttpStream::handshake(socket).await
        })
        .await?;

        let req = self.build_request(&target, stream.is_h2())?;
        let resp = with_timeout(self.read_timeout, NetError::TimedOut, stream.send_request(req))
            .await?;

        tracing::debug!(status = %resp.status(), url = %self.url, "response headers received");
        Ok(HttpResponse::from_hyper(resp, self.read_timeout))
    }
}

impl std::fmt::Debug for HttpNetworkTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNetworkTransaction")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.request_headers)
            .field("content", &self.content)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}
