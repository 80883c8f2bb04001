use crate::base::neterror::NetError;
use crate::socket::client::SocketType;
use crate::socket::target::ConnectionTarget;
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
///
/// When the target carries a resolved address, that address is dialed
/// directly. Otherwise the host is resolved by the OS. Either way the TLS
/// handshake names the target's logical host.
pub struct ConnectJob;

impl ConnectJob {
    /// Connects to `target` and, for https, completes the TLS handshake.
    ///
    /// No limit is applied here; callers bound the whole connect phase with
    /// [`with_timeout`].
    pub async fn connect(
        target: &ConnectionTarget,
        tls: &TlsConfig,
    ) -> Result<SocketType, NetError> {
        let stream = Self::connect_tcp(target).await?;
        if target.scheme().is_secure() {
            Self::handshake(target, tls, stream).await
        } else {
            Ok(SocketType::Tcp(stream))
        }
    }

    async fn connect_tcp(target: &ConnectionTarget) -> Result<TcpStream, NetError> {
        let addrs: Vec<SocketAddr> = match target.address() {
            Some(ip) => vec![SocketAddr::new(ip, target.port())],
            None => {
                // Default OS resolution of the URL host.
                tokio::net::lookup_host((target.host(), target.port()))
                    .await
                    .map_err(|e| {
                        tracing::debug!(host = %target.host(), error = %e, "system resolution failed");
                        NetError::NameNotResolvedFor {
                            domain: target.host().to_string(),
                            source: Arc::new(e),
                        }
                    })?
                    .collect()
            }
        };

        let mut last_err = NetError::NameNotResolved;
        for addr in addrs {
            tracing::debug!(%addr, host = %target.host(), "connecting");
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = NetError::from_io(&e);
                }
            }
        }
        Err(last_err)
    }

    async fn handshake(
        target: &ConnectionTarget,
        tls: &TlsConfig,
        stream: TcpStream,
    ) -> Result<SocketType, NetError> {
        // SNI and hostname verification name the URL host, never the
        // pinned address.
        let host = target
            .tls_server_name()
            .ok_or(NetError::InvalidArgument)?;

        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        tls.apply_to_builder(&mut builder)?;

        let connector = builder.build();
        let mut config = connector.configure().map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        config.set_verify_hostname(tls.verify_peer);

        let tls_stream = tokio_boring::connect(config, host, stream).await.map_err(|e| {
            tracing::debug!(host = %host, error = ?e, "SSL handshake failed");
            NetError::SslProtocolError
        })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}

/// Runs `fut` under `limit`, failing with `on_elapsed` when it runs out.
/// `Duration::ZERO` disables the limit.
pub(crate) async fn with_timeout<T, F>(
    limit: Duration,
    on_elapsed: NetError,
    fut: F,
) -> Result<T, NetError>
where
    F: Future<Output = Result<T, NetError>>,
{
    if limit.is_zero() {
        return fut.await;
    }
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| on_elapsed)?
}
