//! End-to-end request tests against in-process HTTP/1.1 servers.
//!
//! Covers:
//! - Custom resolver picks the dialed address, Host keeps the URL host
//! - No resolver: URL host is dialed directly
//! - Redirects are returned, never followed
//! - Body/method policy enforced before any I/O
//! - Resolver failures propagate
//! - Entity headers and chunked streaming
//! - Read and connect timeouts
//! - Only the first resolved address is dialed
//! - TLS names the URL host when the address is pinned

use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::hash::MessageDigest;
use boring::pkey::{PKey, Private};
use boring::rsa::Rsa;
use boring::ssl::{NameType, SslAcceptor, SslMethod};
use boring::x509::extension::{BasicConstraints, SubjectAlternativeName};
use boring::x509::{X509Builder, X509Name, X509NameBuilder, X509};
use bytes::Bytes;
use http::Method;
use resolvenet::dns::{Addrs, Name, Resolve, Resolving, RoundRobinResolver};
use resolvenet::socket::TlsConfig;
use resolvenet::{Client, NetError, RequestBody, RequestContent};
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";

/// Resolver that always answers with one address and counts its calls.
struct PinnedResolver {
    ip: IpAddr,
    calls: AtomicUsize,
}

impl PinnedResolver {
    fn new(ip: IpAddr) -> Arc<Self> {
        Arc::new(Self {
            ip,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolve for PinnedResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let addr = SocketAddr::new(self.ip, 0);
        Box::pin(async move { Ok(Box::new(std::iter::once(addr)) as Addrs) })
    }
}

/// Resolver that answers with a fixed address list, in order.
struct ListResolver(Vec<IpAddr>);

impl Resolve for ListResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let addrs: Vec<SocketAddr> = self.0.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
        Box::pin(async move { Ok(Box::new(addrs.into_iter()) as Addrs) })
    }
}

struct FailingResolver;

impl Resolve for FailingResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            Err(NetError::NameNotResolvedFor {
                domain: name.to_string(),
                source: Arc::new(io::Error::new(io::ErrorKind::NotFound, "no such host")),
            })
        })
    }
}

fn request_complete(data: &[u8]) -> bool {
    let text = String::from_utf8_lossy(data);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let head = text[..head_end].to_ascii_lowercase();
    let body = &text[head_end + 4..];
    if head.contains("transfer-encoding: chunked") {
        return body.ends_with("0\r\n\r\n");
    }
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= len
}

async fn read_request<S: AsyncRead + Unpin>(socket: &mut S) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if request_complete(&data) {
            break;
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Serves `response` to every connection and reports each raw request along
/// with the local address the client reached.
async fn spawn_server(
    bind: &str,
    response: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<(SocketAddr, String)>) {
    let listener = TcpListener::bind(bind).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let local = socket.local_addr().unwrap();
                    let request = read_request(&mut socket).await;
                    let _ = tx.send((local, request));
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }
    });

    (addr, rx)
}

#[tokio::test]
async fn test_resolver_address_dialed_with_original_host() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;
    let resolver = PinnedResolver::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let client = Client::builder().dns_resolver(resolver.clone()).build();

    // The hostname is not resolvable; only the resolver can make this work.
    let url = format!("http://api.internal.invalid:{}/data?v=1", addr.port());
    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let (_, request) = rx.recv().await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("GET /data?v=1 HTTP/1.1\r\n"), "{request}");
    assert!(
        lower.contains(&format!("host: api.internal.invalid:{}\r\n", addr.port())),
        "{request}"
    );
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_no_resolver_dials_url_host() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;

    let resp = Client::new()
        .get(format!("http://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, request) = rx.recv().await.unwrap();
    assert!(request
        .to_ascii_lowercase()
        .contains(&format!("host: 127.0.0.1:{}\r\n", addr.port())));
}

#[tokio::test]
async fn test_redirect_returned_unmodified() {
    let response = "HTTP/1.1 302 Found\r\nLocation: http://elsewhere.invalid/next\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    let (addr, mut rx) = spawn_server("127.0.0.1:0", response).await;

    let resp = Client::new()
        .get(format!("http://127.0.0.1:{}/start", addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.header_str("location"),
        Some("http://elsewhere.invalid/next")
    );

    let (_, request) = rx.recv().await.unwrap();
    assert!(request.starts_with("GET /start "));
    // Exactly one request reached the server.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_body_on_bodyless_methods_fails_before_io() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;
    let resolver = PinnedResolver::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let client = Client::builder().dns_resolver(resolver.clone()).build();
    let url = format!("http://service.invalid:{}/", addr.port());

    for method in [
        Method::GET,
        Method::HEAD,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ] {
        let err = client
            .request(method.clone(), &url)
            .body("payload")
            .send()
            .await
            .unwrap_err();
        match err {
            NetError::UnsupportedBody { method: m } => assert_eq!(m, method.as_str()),
            other => panic!("{method}: unexpected {other:?}"),
        }
    }

    assert_eq!(resolver.calls(), 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "no connection may be opened");
}

#[tokio::test]
async fn test_bodyless_methods_without_content_succeed() {
    let (addr, _rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;
    let client = Client::new();
    let url = format!("http://127.0.0.1:{}/", addr.port());

    for method in [
        Method::GET,
        Method::HEAD,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ] {
        let resp = client.request(method.clone(), &url).send().await;
        assert_eq!(resp.unwrap().status(), 200, "{method}");
    }
}

#[tokio::test]
async fn test_resolver_failure_propagates() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;
    let client = Client::builder()
        .dns_resolver(Arc::new(FailingResolver))
        .build();

    // 127.0.0.1 would connect fine; the resolver still decides.
    let err = client
        .get(format!("http://127.0.0.1:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_resolution_error());
    assert_eq!(err.as_i32(), -105);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_post_streams_chunked_with_entity_headers() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;

    let body = RequestBody::from_chunks(vec![
        Bytes::from_static(b"hello "),
        Bytes::from_static(b"world"),
    ]);
    let content = RequestContent::new(body)
        .with_content_type("text/plain")
        .with_content_encoding("identity");

    let resp = Client::new()
        .post(format!("http://127.0.0.1:{}/upload", addr.port()))
        .content(content)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, request) = rx.recv().await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /upload HTTP/1.1\r\n"));
    assert!(lower.contains("transfer-encoding: chunked\r\n"), "{request}");
    assert!(lower.contains("content-type: text/plain\r\n"));
    assert!(lower.contains("content-encoding: identity\r\n"));
    assert!(!lower.contains("content-length:"));
    assert!(request.contains("hello "));
    assert!(request.contains("world"));
}

#[tokio::test]
async fn test_put_with_known_length() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;

    let resp = Client::new()
        .put(format!("http://127.0.0.1:{}/item/7", addr.port()))
        .header("X-Request-Id", "abc")
        .body("data")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, request) = rx.recv().await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("content-length: 4\r\n"), "{request}");
    assert!(lower.contains("x-request-id: abc\r\n"));
    assert!(request.ends_with("\r\n\r\ndata"));
}

#[tokio::test]
async fn test_read_timeout_waiting_for_headers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let _ = read_request(&mut socket).await;
            // Never answer.
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    });

    let err = Client::new()
        .get(format!("http://127.0.0.1:{}/", addr.port()))
        .read_timeout(Duration::from_millis(200))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::TimedOut), "{err:?}");
}

#[tokio::test]
async fn test_connect_timeout_bounds_tls_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            // Accept TCP but never answer the ClientHello.
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        }
    });

    let err = Client::builder()
        .dns_resolver(PinnedResolver::new(IpAddr::V4(Ipv4Addr::LOCALHOST)))
        .connect_timeout(Duration::from_millis(200))
        .build()
        .get(format!("https://stalled.example.com:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::ConnectionTimedOut), "{err:?}");
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = Client::new()
        .get(format!("http://127.0.0.1:{}/", port))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::ConnectionRefused), "{err:?}");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_round_robin_alternates_dialed_address() {
    let (addr, mut rx) = spawn_server("0.0.0.0:0", OK_RESPONSE).await;
    let first = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
    let second = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2));
    let resolver = RoundRobinResolver::from_static([("api.example.test", vec![first, second])]);
    let client = Client::builder().dns_resolver(Arc::new(resolver)).build();

    let url = format!("http://api.example.test:{}/", addr.port());
    let mut reached = Vec::new();
    for _ in 0..4 {
        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let (local, request) = rx.recv().await.unwrap();
        assert!(request.to_ascii_lowercase().contains("host: api.example.test:"));
        reached.push(local.ip());
    }
    assert_eq!(reached, vec![first, second, first, second]);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_only_first_resolved_address_is_dialed() {
    let (addr, mut rx) = spawn_server("127.0.0.1:0", OK_RESPONSE).await;
    // 127.0.0.2 has no listener; the reachable address comes second.
    let resolver = ListResolver(vec![
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
    ]);
    let client = Client::builder().dns_resolver(Arc::new(resolver)).build();

    let err = client
        .get(format!("http://service.invalid:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::ConnectionRefused), "{err:?}");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

struct TestPki {
    ca_pem: tempfile::NamedTempFile,
    leaf: X509,
    leaf_key: PKey<Private>,
}

fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn x509_name(cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    name.build()
}

fn cert_builder(cn: &str, serial: u32, key: &PKey<Private>) -> X509Builder {
    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&x509_name(cn)).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder
}

/// A throwaway CA, written to a PEM file, and a leaf for `host` it signed.
fn test_pki(host: &str) -> TestPki {
    let ca_key = rsa_key();
    let mut ca = cert_builder("resolvenet test CA", 1, &ca_key);
    ca.set_issuer_name(&x509_name("resolvenet test CA")).unwrap();
    ca.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    ca.sign(&ca_key, MessageDigest::sha256()).unwrap();
    let ca = ca.build();

    let leaf_key = rsa_key();
    let mut leaf = cert_builder(host, 2, &leaf_key);
    leaf.set_issuer_name(ca.subject_name()).unwrap();
    let san = SubjectAlternativeName::new()
        .dns(host)
        .build(&leaf.x509v3_context(Some(&ca), None))
        .unwrap();
    leaf.append_extension(san).unwrap();
    leaf.sign(&ca_key, MessageDigest::sha256()).unwrap();
    let leaf = leaf.build();

    let mut ca_pem = tempfile::NamedTempFile::new().unwrap();
    ca_pem.write_all(&ca.to_pem().unwrap()).unwrap();
    ca_pem.flush().unwrap();

    TestPki {
        ca_pem,
        leaf,
        leaf_key,
    }
}

/// TLS server on 127.0.0.1 presenting `pki`'s leaf. Reports the SNI each
/// client sent together with its raw request.
async fn spawn_tls_server(
    pki: &TestPki,
) -> (SocketAddr, mpsc::UnboundedReceiver<(Option<String>, String)>) {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pki.leaf_key).unwrap();
    acceptor.set_certificate(&pki.leaf).unwrap();
    let acceptor = Arc::new(acceptor.build());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let Ok(mut stream) = tokio_boring::accept(&acceptor, socket).await else {
                        return;
                    };
                    let sni = stream
                        .ssl()
                        .servername(NameType::HOST_NAME)
                        .map(str::to_string);
                    let request = read_request(&mut stream).await;
                    let _ = tx.send((sni, request));
                    let _ = stream.write_all(OK_RESPONSE.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        }
    });

    (addr, rx)
}

fn verifying_tls(pki: &TestPki) -> TlsConfig {
    TlsConfig {
        ca_file: Some(pki.ca_pem.path().to_path_buf()),
        verify_peer: true,
        ..TlsConfig::default()
    }
}

#[tokio::test]
async fn test_tls_to_pinned_address_uses_url_host() {
    let pki = test_pki("www.example.com");
    let (addr, mut rx) = spawn_tls_server(&pki).await;
    let resolver = PinnedResolver::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let client = Client::builder()
        .dns_resolver(resolver.clone())
        .tls_config(verifying_tls(&pki))
        .build();

    let url = format!("https://www.example.com:{}/secure", addr.port());
    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let (sni, request) = rx.recv().await.unwrap();
    assert_eq!(sni.as_deref(), Some("www.example.com"));
    assert!(request.starts_with("GET /secure HTTP/1.1\r\n"), "{request}");
    assert!(request
        .to_ascii_lowercase()
        .contains(&format!("host: www.example.com:{}\r\n", addr.port())));
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_tls_certificate_checked_against_url_host() {
    let pki = test_pki("www.example.com");
    let (addr, mut rx) = spawn_tls_server(&pki).await;
    let client = Client::builder()
        .dns_resolver(PinnedResolver::new(IpAddr::V4(Ipv4Addr::LOCALHOST)))
        .tls_config(verifying_tls(&pki))
        .build();

    // Same address and trusted chain, but the certificate does not name this host.
    let err = client
        .get(format!("https://other.example.com:{}/", addr.port()))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::SslProtocolError), "{err:?}");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}
