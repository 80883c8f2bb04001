//! Connection targets.
//!
//! A [`ConnectionTarget`] separates *where the socket is dialed* from *who the
//! request is for*. The logical host keeps driving the Host header, TLS SNI
//! and certificate verification; the optional resolved address only changes
//! the TCP peer.

use crate::base::neterror::NetError;
use std::fmt;
use std::net::IpAddr;
use url::{Host, Url};

/// URL schemes the connect job knows how to dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Parses a URL scheme. Anything other than `http`/`https` is rejected.
    pub fn parse(scheme: &str) -> Result<Self, NetError> {
        match scheme {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(NetError::UnknownUrlScheme),
        }
    }

    /// 443 for https, 80 otherwise.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Https => 443,
            Scheme::Http => 80,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn is_secure(self) -> bool {
        self == Scheme::Https
    }
}

/// Returns the port to dial for `url`: the explicit port if present, else the
/// scheme default.
pub fn effective_port(url: &Url) -> Result<u16, NetError> {
    let scheme = Scheme::parse(url.scheme())?;
    Ok(url.port().unwrap_or_else(|| scheme.default_port()))
}

/// The (address, port, scheme) triple used to establish the socket, plus the
/// logical host it stands in for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    host: String,
    address: Option<IpAddr>,
    port: u16,
    explicit_port: bool,
    scheme: Scheme,
}

impl ConnectionTarget {
    /// Builds a host-based target from a URL. The socket will be dialed by
    /// resolving the URL host through the operating system.
    pub fn from_url(url: &Url) -> Result<Self, NetError> {
        let scheme = Scheme::parse(url.scheme())?;
        let host = match url.host().ok_or(NetError::InvalidUrl)? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        };
        if host.is_empty() {
            return Err(NetError::InvalidUrl);
        }
        Ok(Self {
            host,
            address: None,
            port: effective_port(url)?,
            explicit_port: url.port().is_some(),
            scheme,
        })
    }

    /// Pins the socket to `address`, leaving the logical host untouched.
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// The hostname the request is addressed to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The resolved address to dial, if a resolver picked one.
    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// True when the socket peer comes from a custom resolver.
    pub fn is_resolved(&self) -> bool {
        self.address.is_some()
    }

    /// Name presented in TLS SNI and checked against the server certificate.
    /// `None` for plain-text targets.
    pub fn tls_server_name(&self) -> Option<&str> {
        self.scheme.is_secure().then_some(self.host.as_str())
    }

    /// Value for the HTTP/1.1 Host header. The port is only included when the
    /// URL spelled it out.
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.explicit_port {
            format!("{}:{}", host, self.port)
        } else {
            host
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(ip) if ip.is_ipv6() => write!(
                f,
                "{}://[{}]:{} (host {})",
                self.scheme.as_str(),
                ip,
                self.port,
                self.host
            ),
            Some(ip) => write!(
                f,
                "{}://{}:{} (host {})",
                self.scheme.as_str(),
                ip,
                self.port,
                self.host
            ),
            None => write!(f, "{}://{}", self.scheme.as_str(), self.host_header()),
        }
    }
}
