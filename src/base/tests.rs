use crate::base::neterror::NetError;
use std::io;
use std::sync::Arc;

#[test]
fn test_net_error_roundtrip() {
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    let custom = NetError::HttpBodyError;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -10001);
    assert!(matches!(
        NetError::from(custom_code),
        NetError::HttpBodyError
    ));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
    assert_eq!(err.as_i32(), -9999);
}

#[test]
fn test_name_not_resolved_for_shares_code() {
    let err = NetError::NameNotResolvedFor {
        domain: "nowhere.invalid".to_string(),
        source: Arc::new(io::Error::new(io::ErrorKind::NotFound, "no records")),
    };
    assert_eq!(err.as_i32(), NetError::NameNotResolved.as_i32());
    assert!(err.is_resolution_error());
    assert_eq!(err.to_string(), "Name not resolved: nowhere.invalid");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unsupported_body_names_method() {
    let err = NetError::UnsupportedBody {
        method: "GET".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "HTTP transport does not support GET requests with content"
    );
    assert!(!err.is_resolution_error());
}

#[test]
fn test_from_io_maps_socket_errors() {
    let cases = [
        (io::ErrorKind::ConnectionRefused, -102),
        (io::ErrorKind::ConnectionReset, -101),
        (io::ErrorKind::TimedOut, -118),
        (io::ErrorKind::BrokenPipe, -100),
        (io::ErrorKind::Other, -104),
    ];
    for (kind, code) in cases {
        let err = NetError::from_io(&io::Error::new(kind, "socket"));
        assert_eq!(err.as_i32(), code, "kind {:?}", kind);
    }
}

#[test]
fn test_context_variants_decode_by_code_only() {
    let unsupported = NetError::UnsupportedBody {
        method: "HEAD".to_string(),
    };
    let decoded = NetError::from(unsupported.as_i32());
    assert!(matches!(decoded, NetError::Unknown(-10004)));
    assert_eq!(decoded.as_i32(), unsupported.as_i32());

    let unresolved = NetError::NameNotResolvedFor {
        domain: "nowhere.invalid".to_string(),
        source: Arc::new(io::Error::new(io::ErrorKind::NotFound, "no records")),
    };
    let decoded = NetError::from(unresolved.as_i32());
    assert!(matches!(decoded, NetError::NameNotResolved));
    assert!(decoded.is_resolution_error());
}
