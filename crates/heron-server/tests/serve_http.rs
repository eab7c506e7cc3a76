//! Serves real HTTP/1.1 connections over a loopback listener.

use std::time::Duration;

use heron_config::{FilterParams, HeronConfig};
use heron_server::{app, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(config: &HeronConfig) -> (std::net::SocketAddr, ShutdownSignal, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let server = app::build_server(config);
    let task = tokio::spawn(server.serve(listener, shutdown.clone()));
    (addr, shutdown, task)
}

async fn send(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap().to_ascii_lowercase()
}

#[tokio::test]
async fn test_configured_headers_on_the_wire() {
    let mut filter = FilterParams::new();
    filter.insert("x-frame-options", "DENY");
    filter.insert("x-multi", vec!["a".to_string(), "b".to_string()]);
    let config = HeronConfig::builder().filter(filter).build();

    let (addr, shutdown, task) = start(&config).await;
    let response = send(addr, "/page").await;

    assert!(response.starts_with("http/1.1 200 ok"));
    assert!(response.contains("x-frame-options: deny\r\n"));
    assert!(response.contains("x-multi: a\r\n"));
    assert!(response.contains("x-multi: b\r\n"));
    assert!(response.ends_with("heron: get /page\n"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server should stop")
        .unwrap();
}

#[tokio::test]
async fn test_health_endpoint_on_the_wire() {
    let config = HeronConfig::builder()
        .filter([("x-frame-options", "DENY")].into_iter().collect())
        .build();

    let (addr, shutdown, task) = start(&config).await;
    let response = send(addr, "/health").await;

    assert!(response.starts_with("http/1.1 200 ok"));
    assert!(response.contains("content-type: application/json"));
    assert!(!response.contains("x-frame-options"));
    assert!(response.ends_with(r#"{"status":"ok"}"#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server should stop")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_with_no_connections_returns() {
    let (_addr, shutdown, task) = start(&HeronConfig::default()).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server should stop")
        .unwrap();
}
