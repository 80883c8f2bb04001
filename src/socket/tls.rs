use crate::base::neterror::NetError;
use boring::ssl::{SslConnectorBuilder, SslVerifyMode, SslVersion};
use std::path::PathBuf;

/// TLS settings applied to every handshake a [`Client`](crate::client::Client)
/// performs.
///
/// Server name indication and certificate hostname checks always use the
/// request's URL host, never the address a custom resolver dialed.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    /// Extra PEM bundle of trusted roots, on top of the system store.
    pub ca_file: Option<PathBuf>,
    /// Verify the peer chain and hostname. Only turn off against test servers.
    pub verify_peer: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: vec!["h2".to_string(), "http/1.1".to_string()],
            ca_file: None,
            verify_peer: true,
        }
    }
}

impl TlsConfig {
    /// Restrict ALPN to HTTP/1.1.
    pub fn http1_only(mut self) -> Self {
        self.alpn_protos = vec!["http/1.1".to_string()];
        self
    }

    /// Encodes the ALPN list in wire format (length-prefixed protocol ids).
    pub fn alpn_wire(&self) -> Result<Vec<u8>, NetError> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protos {
            let len = u8::try_from(proto.len()).map_err(|_| NetError::InvalidArgument)?;
            if len == 0 {
                return Err(NetError::InvalidArgument);
            }
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder.set_min_proto_version(Some(min)).map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder.set_max_proto_version(Some(max)).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            builder
                .set_alpn_protos(&self.alpn_wire()?)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(ca_file) = &self.ca_file {
            builder.set_ca_file(ca_file).map_err(|e| {
                tracing::warn!(path = %ca_file.display(), error = %e, "failed to load CA file");
                NetError::SslProtocolError
            })?;
        }

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}
