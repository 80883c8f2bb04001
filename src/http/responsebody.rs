//! Response body streaming.
//! Mirrors Chromium's HttpStream::ReadResponseBody.

use crate::base::neterror::NetError;
use crate::socket::connectjob::with_timeout;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use std::time::Duration;

/// Response body wrapper for streaming.
///
/// Each read waits at most the request's read timeout for the next chunk.
pub struct ResponseBody {
    inner: Incoming,
    read_timeout: Duration,
}

impl ResponseBody {
    /// Create a new response body wrapper.
    pub fn new(inner: Incoming, read_timeout: Duration) -> Self {
        Self {
            inner,
            read_timeout,
        }
    }

    /// Read the next data chunk. `Ok(None)` marks the end of the body.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, NetError> {
        let inner = &mut self.inner;
        with_timeout(self.read_timeout, NetError::TimedOut, async move {
            loop {
                match inner.frame().await {
                    None => return Ok(None),
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "response body read failed");
                        return Err(NetError::HttpBodyError);
                    }
                    Some(Ok(frame)) => {
                        // Trailers carry no payload.
                        if let Ok(data) = frame.into_data() {
                            return Ok(Some(data));
                        }
                    }
                }
            }
        })
        .await
    }

    /// Read entire body as bytes.
    pub async fn bytes(mut self) -> Result<Bytes, NetError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Read body as UTF-8 string.
    pub async fn text(self) -> Result<String, NetError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetError::InvalidUtf8)
    }

    /// Read body as JSON, deserializing to type T.
    #[cfg(feature = "json")]
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, NetError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|_| NetError::JsonParseError)
    }
}
