//! End-to-end tests: real relay, real mock upstream, real sockets.

use axum::http::{header, StatusCode};
use serde_json::Value;

mod common;

use common::{
    client, closed_addr, relay_url, start_relay, start_truncating_upstream, start_upstream,
    test_config,
};

async fn envelope(res: reqwest::Response) -> Value {
    assert_eq!(res.status(), StatusCode::OK, "errors are always delivered with 200");
    res.json().await.expect("error body should be JSON")
}

#[tokio::test]
async fn get_returns_upstream_body_verbatim() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;
    let client = client();

    let direct = client
        .get(format!("http://{upstream}/binary"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let relayed = client
        .get(relay_url(relay, &format!("http://{upstream}/binary")))
        .send()
        .await
        .unwrap();

    assert_eq!(relayed.status(), StatusCode::OK);
    assert_eq!(relayed.headers()[header::CONTENT_LENGTH], "256");
    assert_eq!(relayed.bytes().await.unwrap(), direct);
}

#[tokio::test]
async fn post_body_reaches_upstream_unchanged() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let payload: Vec<u8> = b"{\"k\":\"v\"}\r\n\x00\xff binary tail".to_vec();
    let res = client()
        .post(relay_url(relay, &format!("http://{upstream}/echo")))
        .header(header::ORIGIN, "https://app.example")
        .body(payload.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    // Upstream headers are not relayed back.
    assert!(!res.headers().contains_key("x-upstream-method"));
    assert_eq!(res.bytes().await.unwrap().to_vec(), payload);
}

#[tokio::test]
async fn inbound_headers_are_not_copied_upstream() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/seen-origin")))
        .header(header::ORIGIN, "https://app.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "none");
}

#[tokio::test]
async fn all_methods_relays_put() {
    let upstream = start_upstream().await;
    let mut config = test_config();
    config.forward.all_methods = true;
    let (relay, _shutdown) = start_relay(config).await;

    let res = client()
        .put(relay_url(relay, &format!("http://{upstream}/echo")))
        .body("put body")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "put body");

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/hello")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "Hello from upstream");
}

#[tokio::test]
async fn malformed_target_is_an_error_envelope_not_a_crash() {
    // A malformed client URL is an ordinary error result here; the process
    // keeps serving instead of treating it as a fatal fault.
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;
    let client = client();

    for target in ["not a url", "example.com/no-scheme", "http://"] {
        let res = client.get(relay_url(relay, target)).send().await.unwrap();
        let json = envelope(res).await;
        assert_eq!(json["success"], false);
        assert!(
            json["err"].as_str().unwrap().starts_with("HTTP Request Build Error"),
            "{target}: {json}"
        );
    }

    // Still alive.
    let res = client
        .get(relay_url(relay, &format!("http://{upstream}/hello")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "Hello from upstream");
}

#[tokio::test]
async fn refused_connection_reports_transport_error() {
    let dead = closed_addr().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{dead}/")))
        .send()
        .await
        .unwrap();
    let json = envelope(res).await;
    assert_eq!(json["success"], false);
    assert!(json["err"].as_str().unwrap().starts_with("HTTP Request Error"));
}

#[tokio::test]
async fn truncated_upstream_body_reports_read_error() {
    let upstream = start_truncating_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/")))
        .send()
        .await
        .unwrap();
    let json = envelope(res).await;
    assert_eq!(json["success"], false);
    let err = json["err"].as_str().unwrap();
    assert!(err.starts_with("HTTP Request Read Content Error"), "{err}");
}

#[tokio::test]
async fn first_url_parameter_is_the_target() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(format!(
            "http://{relay}/?url=http://{upstream}/hello&url=http://{upstream}/json"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Hello from upstream");
}

#[tokio::test]
async fn slow_upstream_hits_request_timeout() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/slow")))
        .send()
        .await
        .unwrap();
    let json = envelope(res).await;
    let err = json["err"].as_str().unwrap();
    assert!(err.starts_with("HTTP Request Error"), "{err}");
}

#[tokio::test]
async fn upstream_error_status_is_not_elevated() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    for code in [404u16, 500, 503] {
        let res = client()
            .get(relay_url(relay, &format!("http://{upstream}/status/{code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), format!("status {code}"));
    }
}

#[tokio::test]
async fn every_response_carries_cors_header() {
    let upstream = start_upstream().await;
    let dead = closed_addr().await;
    let (relay, _shutdown) = start_relay(test_config()).await;
    let client = client();

    let urls = [
        relay_url(relay, &format!("http://{upstream}/hello")),
        relay_url(relay, &format!("http://{upstream}/status/500")),
        relay_url(relay, &format!("http://{dead}/")),
        relay_url(relay, "::garbage::"),
        format!("http://{relay}/no/such/path"),
    ];
    for url in urls {
        let res = client
            .get(&url)
            .header(header::ORIGIN, "https://app.example")
            .send()
            .await
            .unwrap();
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*",
            "missing CORS header for {url}"
        );
    }

    let preflight = client
        .request(reqwest::Method::OPTIONS, relay_url(relay, "http://x.example/"))
        .header(header::ORIGIN, "https://app.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await
        .unwrap();
    assert!(preflight.status().is_success());
    assert_eq!(preflight.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn success_framing_headers() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/hello")))
        .send()
        .await
        .unwrap();
    let headers = res.headers();
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert!(headers.contains_key("x-request-id"));

    let last_modified = headers[header::LAST_MODIFIED].to_str().unwrap();
    let stamped = httpdate::parse_http_date(last_modified).unwrap();
    let age = std::time::SystemTime::now()
        .duration_since(stamped)
        .unwrap_or_default();
    assert!(age.as_secs() < 5, "Last-Modified should be the relay time");
}

#[tokio::test]
async fn range_request_is_served_partially() {
    let upstream = start_upstream().await;
    let (relay, _shutdown) = start_relay(test_config()).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/hello")))
        .header(header::RANGE, "bytes=0-4")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 0-4/19");
    assert_eq!(res.text().await.unwrap(), "Hello");
}

#[tokio::test]
async fn content_type_follows_configuration() {
    let upstream = start_upstream().await;
    let target = format!("http://{upstream}/json");

    let (relay, _keep) = start_relay(test_config()).await;
    let res = client().get(relay_url(relay, &target)).send().await.unwrap();
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

    let mut bare = test_config();
    bare.forward.preserve_content_type = false;
    let (relay, _keep_bare) = start_relay(bare).await;
    let res = client().get(relay_url(relay, &target)).send().await.unwrap();
    assert!(!res.headers().contains_key(header::CONTENT_TYPE));
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);
}

#[tokio::test]
async fn private_targets_refused_when_configured() {
    let upstream = start_upstream().await;
    let mut config = test_config();
    config.security.block_private_targets = true;
    let (relay, _shutdown) = start_relay(config).await;

    let res = client()
        .get(relay_url(relay, &format!("http://{upstream}/hello")))
        .send()
        .await
        .unwrap();
    let json = envelope(res).await;
    assert!(json["err"]
        .as_str()
        .unwrap()
        .starts_with("HTTP Request Target Rejected"));
}
