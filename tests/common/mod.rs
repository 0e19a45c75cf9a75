//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cors_relay::config::RelayConfig;
use cors_relay::http::HttpServer;
use cors_relay::lifecycle::Shutdown;

/// Start a mock upstream on an ephemeral port.
///
/// Routes:
/// - `/hello`: fixed text body
/// - `/json`: JSON body with `application/json`
/// - `/echo`: any method, returns the request body and reports the method
/// - `/seen-origin`: the `Origin` header the upstream received, or `none`
/// - `/status/{code}`: responds with that status
/// - `/id/{n}`: body `target-{n}` after a short jittered delay
/// - `/slow`: sleeps longer than test timeouts
/// - `/binary`: every byte value once
pub async fn start_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/hello", get(|| async { "Hello from upstream" }))
        .route(
            "/json",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], r#"{"ok":true}"#) }),
        )
        .route("/echo", any(echo))
        .route("/seen-origin", get(seen_origin))
        .route("/status/{code}", get(status))
        .route("/id/{n}", get(identify))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        )
        .route("/binary", get(|| async { (0u8..=255).collect::<Vec<u8>>() }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(method: Method, body: Bytes) -> impl IntoResponse {
    ([("x-upstream-method", method.to_string())], body)
}

async fn seen_origin(headers: HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::OK);
    (status, format!("status {code}"))
}

async fn identify(Path(n): Path<u32>) -> String {
    tokio::time::sleep(Duration::from_millis(u64::from(n % 7) * 5)).await;
    format!("target-{n}")
}

/// Start an upstream that promises a 100-byte body, sends 5 bytes, and
/// closes the connection.
#[allow(dead_code)]
pub async fn start_truncating_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Config suitable for tests: no system proxy, short timeouts.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.forward.use_system_proxy = false;
    config.timeouts.connect_secs = 2;
    config.timeouts.request_secs = 2;
    config
}

/// Start the relay with `config` on an ephemeral port.
///
/// Keep the returned [`Shutdown`] alive for as long as the relay is needed.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Relay URL for a target.
pub fn relay_url(relay: SocketAddr, target: &str) -> String {
    let mut url = url::Url::parse(&format!("http://{relay}/")).unwrap();
    url.query_pairs_mut().append_pair("url", target);
    url.to_string()
}

/// Test client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
