//! Request content for methods that carry an entity body.

use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use std::fmt;
use std::io;
use std::pin::Pin;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Body type handed to hyper.
pub type OutgoingBody = UnsyncBoxBody<Bytes, io::Error>;

/// Request body for HTTP methods that send data.
#[derive(Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
    /// Body produced incrementally; written as it is polled.
    Stream(BodyStream),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(s: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl RequestBody {
    /// Wraps a chunk stream as a body.
    pub fn stream<S>(s: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        RequestBody::Stream(Box::pin(s))
    }

    /// Streams the given chunks in order. Mostly useful in tests.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::stream(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Length in bytes when known up front. Streams report `None`.
    pub fn known_len(&self) -> Option<u64> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(b) => Some(b.len() as u64),
            RequestBody::Stream(_) => None,
        }
    }

    /// Converts into the boxed body hyper sends.
    pub fn into_outgoing(self) -> OutgoingBody {
        match self {
            RequestBody::Empty => Empty::new().map_err(|never| match never {}).boxed_unsync(),
            RequestBody::Bytes(b) => Full::new(b).map_err(|never| match never {}).boxed_unsync(),
            RequestBody::Stream(s) => StreamBody::new(s.map_ok(Frame::data)).boxed_unsync(),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            RequestBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Body plus the entity metadata that goes with it.
///
/// `length` is the declared size sent as `Content-Length`; leave it `None`
/// for streams of unknown size, which are then sent chunked over HTTP/1.1.
#[derive(Debug, Default)]
pub struct RequestContent {
    pub body: RequestBody,
    pub length: Option<u64>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
}

impl RequestContent {
    pub fn new(body: impl Into<RequestBody>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    /// Declared length, falling back to the body's own size.
    pub fn content_length(&self) -> Option<u64> {
        self.length.or_else(|| self.body.known_len())
    }
}
