//! Token refresh against a minimal HTTP endpoint

use async_trait::async_trait;
use cloudweave_cloud_cloudit::error::Result;
use cloudweave_cloud_cloudit::{Engine, Reauthenticate, RestClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const FRESH_TOKEN: &str = "fresh-token";

struct CountingAuth {
    calls: AtomicUsize,
    token: String,
}

impl CountingAuth {
    fn new(token: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            token: token.to_string(),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reauthenticate for CountingAuth {
    async fn reauthenticate(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }
}

/// Answers 200 only when the request carries the fresh token
async fn serve(listener: TcpListener, hits: Arc<AtomicUsize>) {
    loop {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(answer(stream));
    }
}

async fn answer(mut stream: TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf).to_ascii_lowercase();
    let authorized = head
        .lines()
        .any(|l| l.trim() == format!("x-auth-token: {}", FRESH_TOKEN));

    let (status, body) = if authorized {
        ("200 OK", r#"[{"id":"subnet-1","name":"Default Network"}]"#)
    } else {
        ("401 Unauthorized", r#"{"error":"token expired"}"#)
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn start_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    tokio::spawn(serve(listener, hits.clone()));
    (base, hits)
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let (base, hits) = start_server().await;
    let auth = CountingAuth::new(FRESH_TOKEN);
    let client = RestClient::new(&base, "tenant-1", "stale-token").with_reauthenticate(auth.clone());

    let url = client.url(Engine::Dna, &["subnets"]);
    let subnets: serde_json::Value = client.get(&url).await.unwrap();

    assert_eq!(subnets[0]["id"], "subnet-1");
    assert_eq!(auth.calls(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(client.token().await, FRESH_TOKEN);

    // the refreshed token is reused without another round trip
    let _: serde_json::Value = client.get(&url).await.unwrap();
    assert_eq!(auth.calls(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_happens_only_once() {
    let (base, hits) = start_server().await;
    let auth = CountingAuth::new("still-stale");
    let client = RestClient::new(&base, "tenant-1", "stale-token").with_reauthenticate(auth.clone());

    let url = client.url(Engine::Ace, &["servers"]);
    let err = client.get::<serde_json::Value>(&url).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(auth.calls(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_without_reauthenticate_401_is_returned() {
    let (base, hits) = start_server().await;
    let client = RestClient::new(&base, "tenant-1", "stale-token");

    let url = client.url(Engine::Ace, &["servers"]);
    let err = client.get::<serde_json::Value>(&url).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("401"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
