use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by every layer of the crate, numbered after Chromium's
/// `net_error_list.h` where a counterpart exists.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Generic Errors
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Operation timed out")]
    TimedOut,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved: {domain}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Connection timed out")]
    ConnectionTimedOut,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Empty response")]
    EmptyResponse,
    #[error("HTTP/2 protocol error")]
    Http2ProtocolError,

    // Adapter Errors (custom codes starting at -10000)
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Error reading HTTP body")]
    HttpBodyError,
    #[error("Body is not valid UTF-8")]
    InvalidUtf8,
    #[error("Failed to parse JSON body")]
    JsonParseError,
    #[error("HTTP transport does not support {method} requests with content")]
    UnsupportedBody { method: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidArgument => -4,
            NetError::TimedOut => -7,
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::AddressInvalid => -108,
            NetError::ConnectionTimedOut => -118,
            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidResponse => -320,
            NetError::EmptyResponse => -324,
            NetError::Http2ProtocolError => -337,
            NetError::InvalidHeader => -10000,
            NetError::HttpBodyError => -10001,
            NetError::InvalidUtf8 => -10002,
            NetError::JsonParseError => -10003,
            NetError::UnsupportedBody { .. } => -10004,
            NetError::Unknown(code) => *code,
        }
    }

    /// Maps an OS-level socket error onto the closest net error.
    ///
    /// Mirrors Chromium's `MapSystemError`.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
            io::ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
            io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe => NetError::ConnectionClosed,
            io::ErrorKind::UnexpectedEof => NetError::ConnectionClosed,
            io::ErrorKind::AddrNotAvailable => NetError::AddressInvalid,
            io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            io::ErrorKind::InvalidInput => NetError::InvalidArgument,
            _ => NetError::ConnectionFailed,
        }
    }

    /// True for failures raised while turning a hostname into addresses.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. }
        )
    }
}

/// Decodes a bare code.
///
/// Variants that carry context decode lossily: -105 yields `NameNotResolved`
/// without a domain, and -10004 has no context-free variant, so it stays
/// `Unknown(-10004)`. The numeric code survives either way.
impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -4 => NetError::InvalidArgument,
            -7 => NetError::TimedOut,
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -108 => NetError::AddressInvalid,
            -118 => NetError::ConnectionTimedOut,
            -300 => NetError::InvalidUrl,
            -302 => NetError::UnknownUrlScheme,
            -320 => NetError::InvalidResponse,
            -324 => NetError::EmptyResponse,
            -337 => NetError::Http2ProtocolError,
            -10000 => NetError::InvalidHeader,
            -10001 => NetError::HttpBodyError,
            -10002 => NetError::InvalidUtf8,
            -10003 => NetError::JsonParseError,
            _ => NetError::Unknown(code),
        }
    }
}
