//! End-to-end scrape tests against a real listener on an ephemeral port.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use metrixd_core::{BuildInfo, EnvironmentClass, MetrixdError};
use metrixd_exporter::config::ExporterConfig;
use metrixd_exporter::ExporterService;

async fn spawn_exporter(environment: EnvironmentClass) -> SocketAddr {
    spawn_exporter_with(&ExporterConfig::default(), environment).await
}

async fn spawn_exporter_with(cfg: &ExporterConfig, environment: EnvironmentClass) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = ExporterService::new(cfg, BuildInfo::new("9.9.9", "1.80.0"), environment).unwrap();
    tokio::spawn(service.serve(listener));
    addr
}

/// Short timeouts: header 200ms, request/write 500ms, idle `idle_ms`.
fn short_timeouts(idle_ms: u64) -> ExporterConfig {
    let mut cfg = ExporterConfig::default();
    cfg.server.header_read_timeout_ms = 200;
    cfg.server.request_timeout_ms = 500;
    cfg.server.write_timeout_ms = 500;
    cfg.server.idle_timeout_ms = idle_ms;
    cfg.validate().unwrap();
    cfg
}

/// Send one keep-alive GET and read exactly one response off `stream`.
async fn get_keep_alive(stream: &mut TcpStream, path: &str) -> (u16, String) {
    let req = format!("GET {path} HTTP/1.1\r\nHost: metrixd\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(i) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response headers");
        raw.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(raw[..head_end].to_vec()).unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    let len: usize = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse().unwrap())
        })
        .expect("no content-length");

    while raw.len() < head_end + len {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        raw.extend_from_slice(&chunk[..n]);
    }
    (status, String::from_utf8(raw[head_end..head_end + len].to_vec()).unwrap())
}

/// Minimal HTTP/1.1 GET; returns (status, body).
async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").expect("no header terminator");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("no status code");
    (status, body.to_string())
}

fn line_of<'a>(body: &'a str, metric: &str) -> &'a str {
    body.lines()
        .find(|l| l.starts_with(metric) && !l.starts_with('#'))
        .unwrap_or_else(|| panic!("{metric} missing from:\n{body}"))
}

#[tokio::test]
async fn metrics_path_serves_constant_gauges() {
    let addr = spawn_exporter(EnvironmentClass::Container).await;
    let (status, body) = get(addr, "/metrics").await;

    assert_eq!(status, 200);
    assert_eq!(line_of(&body, "host_environment_info"), "host_environment_info{type=\"container\"} 1");
    assert_eq!(
        line_of(&body, "metrixd_build_info"),
        "metrixd_build_info{rustc_version=\"1.80.0\",version=\"9.9.9\"} 1"
    );
    assert!(body.contains("tokio_runtime_workers"));
}

#[tokio::test]
async fn root_path_serves_same_payload() {
    let addr = spawn_exporter(EnvironmentClass::Vm).await;
    let (status, body) = get(addr, "/").await;

    assert_eq!(status, 200);
    assert_eq!(line_of(&body, "host_environment_info"), "host_environment_info{type=\"vm\"} 1");
    assert!(body.contains("metrixd_build_info{"));
}

#[tokio::test]
async fn unknown_path_is_404() {
    let addr = spawn_exporter(EnvironmentClass::Physical).await;
    let (status, _) = get(addr, "/healthz").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn concurrent_scrapes_agree_on_constant_gauges() {
    let addr = spawn_exporter(EnvironmentClass::Physical).await;

    let (a, b) = tokio::join!(get(addr, "/metrics"), get(addr, "/metrics"));
    assert_eq!(a.0, 200);
    assert_eq!(b.0, 200);
    for metric in ["host_environment_info", "metrixd_build_info"] {
        assert_eq!(line_of(&a.1, metric), line_of(&b.1, metric));
    }
}

#[tokio::test]
async fn kept_alive_connection_outlives_header_timeout() {
    let addr = spawn_exporter_with(&short_timeouts(3_000), EnvironmentClass::Vm).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let (status, first) = get_keep_alive(&mut stream, "/metrics").await;
    assert_eq!(status, 200);

    // Several header timeouts pass with nothing in flight.
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    let (status, second) = get_keep_alive(&mut stream, "/metrics").await;
    assert_eq!(status, 200);
    assert_eq!(
        line_of(&first, "host_environment_info"),
        line_of(&second, "host_environment_info")
    );
}

#[tokio::test]
async fn kept_alive_connection_closes_after_idle_timeout() {
    let addr = spawn_exporter_with(&short_timeouts(1_000), EnvironmentClass::Vm).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let (status, _) = get_keep_alive(&mut stream, "/metrics").await;
    assert_eq!(status, 200);

    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("idle connection was never closed")
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn silent_connection_is_dropped_after_header_timeout() {
    let addr = spawn_exporter_with(&short_timeouts(3_000), EnvironmentClass::Vm).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let started = std::time::Instant::now();
    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf))
        .await
        .expect("silent connection was never closed")
        .unwrap_or(0);
    assert_eq!(n, 0);
    assert!(started.elapsed() < Duration::from_millis(2_000));
}

#[tokio::test]
async fn start_reports_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let service = ExporterService::new(
        &ExporterConfig::default(),
        BuildInfo::default(),
        EnvironmentClass::Physical,
    )
    .unwrap();
    let err = service.start(&addr.to_string()).await.unwrap_err();

    assert!(matches!(err, MetrixdError::Bind { .. }), "{err}");
    assert_ne!(err.exit_code(), 0);
}

#[tokio::test]
async fn start_rejects_invalid_address() {
    let service = ExporterService::new(
        &ExporterConfig::default(),
        BuildInfo::default(),
        EnvironmentClass::Physical,
    )
    .unwrap();
    let err = service.start("nope").await.unwrap_err();
    assert!(matches!(err, MetrixdError::InvalidAddress(_)), "{err}");
}
