use crate::base::neterror::NetError;
use crate::http::requestbody::OutgoingBody;
use crate::socket::client::SocketType;
use http::{Request, Response};
use hyper::body::Incoming;
use hyper::client::conn::{http1, http2};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::error::Error as StdError;
use std::io;
use tokio::spawn;

/// Wraps the underlying protocol stream (H1/H2) on one connected socket.
/// Equivalent to net::HttpStream.
pub enum HttpStream {
    H1(http1::SendRequest<OutgoingBody>),
    H2(http2::SendRequest<OutgoingBody>),
}

impl HttpStream {
    /// Runs the protocol handshake chosen by ALPN (HTTP/1.1 when no TLS) and
    /// spawns the connection driver.
    pub async fn handshake(socket: SocketType) -> Result<Self, NetError> {
        let h2 = socket.negotiated_h2();
        let io = TokioIo::new(socket);

        if h2 {
            let (sender, conn) = http2::handshake(TokioExecutor::new(), io)
                .await
                .map_err(|e| {
                    tracing::debug!(error = %e, "HTTP/2 handshake failed");
                    NetError::Http2ProtocolError
                })?;
            spawn(async move {
                if let Err(e) = conn.await {
                    tracing::warn!(error = %e, "HTTP/2 connection failed");
                }
            });
            Ok(HttpStream::H2(sender))
        } else {
            let (sender, conn) = http1::handshake(io).await.map_err(|e| map_hyper_error(&e))?;
            spawn(async move {
                if let Err(e) = conn.await {
                    tracing::warn!(error = %e, "HTTP/1.1 connection failed");
                }
            });
            Ok(HttpStream::H1(sender))
        }
    }

    pub fn is_h2(&self) -> bool {
        matches!(self, HttpStream::H2(_))
    }

    pub async fn send_request(
        &mut self,
        req: Request<OutgoingBody>,
    ) -> Result<Response<Incoming>, NetError> {
        let result = match self {
            HttpStream::H1(sender) => sender.send_request(req).await,
            HttpStream::H2(sender) => sender.send_request(req).await,
        };
        result.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            map_hyper_error(&e)
        })
    }
}

/// Classifies a hyper failure, falling back to the underlying socket error.
pub(crate) fn map_hyper_error(err: &hyper::Error) -> NetError {
    if err.is_timeout() {
        return NetError::TimedOut;
    }
    if err.is_parse() {
        return NetError::InvalidResponse;
    }
    if err.is_incomplete_message() {
        return NetError::EmptyResponse;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return NetError::from_io(io_err);
        }
        source = cause.source();
    }

    if err.is_canceled() || err.is_closed() {
        return NetError::ConnectionClosed;
    }
    NetError::ConnectionFailed
}
