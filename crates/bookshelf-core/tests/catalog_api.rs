//! End-to-end tests over a real socket

use bookshelf_core::{fixture_books, Book, Catalog, CatalogLayout, Server, ServerConfig};
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct TestServer {
    addr: SocketAddr,
    server: Arc<Server>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start(layout: CatalogLayout) -> Self {
        let config = ServerConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            catalog_layout: layout,
            shutdown_timeout: Duration::from_secs(2),
            ..ServerConfig::default()
        };
        let catalog = Arc::new(Catalog::fixtures(layout).unwrap());
        let server = Arc::new(Server::new(config, catalog).unwrap());
        let listener = server.bind().unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn({
            let server = server.clone();
            async move {
                server
                    .serve(listener, async move {
                        let _ = rx.await;
                    })
                    .await
                    .unwrap();
            }
        });

        Self {
            addr,
            server,
            shutdown: Some(tx),
            task,
        }
    }

    async fn request(&self, method: &str, path: &str) -> RawResponse {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        parse_response(&raw)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    RawResponse { status, headers, body }
}

#[tokio::test]
async fn get_books_returns_fixtures() {
    let server = TestServer::start(CatalogLayout::Sequence).await;

    let res = server.request("GET", "/api/books").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), Some("application/json; charset=utf-8"));
    assert!(res.header("x-request-id").is_some());

    let books: Vec<Book> = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(books, fixture_books());

    server.stop().await;
}

#[tokio::test]
async fn keyed_catalog_is_sorted_by_isbn() {
    let server = TestServer::start(CatalogLayout::Keyed).await;

    let res = server.request("GET", "/api/books").await;
    let books: Vec<Book> = serde_json::from_slice(&res.body).unwrap();
    let isbns: Vec<&str> = books.iter().map(|b| b.isbn.as_str()).collect();
    assert_eq!(isbns, vec!["0000000000", "0345391802"]);

    // Same bytes on every request
    let again = server.request("GET", "/api/books").await;
    assert_eq!(again.body, res.body);

    server.stop().await;
}

#[tokio::test]
async fn delete_is_rejected_and_catalog_unchanged() {
    let server = TestServer::start(CatalogLayout::Keyed).await;
    let before = server.request("GET", "/api/books").await.body;

    let res = server.request("DELETE", "/api/books").await;
    assert_eq!(res.status, 405);
    assert_eq!(res.header("allow"), Some("GET"));
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["error"], "Method Not Allowed");

    let after = server.request("GET", "/api/books").await.body;
    assert_eq!(before, after);
    assert_eq!(server.server.state().catalog().len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let server = TestServer::start(CatalogLayout::Keyed).await;

    assert_eq!(server.request("GET", "/api/book").await.status, 404);
    assert_eq!(server.request("POST", "/healthz").await.status, 405);
    let brew = server.request("BREW", "/api/books").await;
    assert_eq!(brew.status, 501);
    assert!(brew.header("x-request-id").is_some());
    assert_eq!(server.request("GET", "/healthz").await.status, 200);

    server.stop().await;
}

#[tokio::test]
async fn shutdown_drains_and_flips_readiness() {
    let server = TestServer::start(CatalogLayout::Keyed).await;
    assert_eq!(server.request("GET", "/readyz").await.status, 200);

    let handle = server.server.clone();
    server.stop().await;

    assert!(handle.is_shutting_down());
    assert!(!handle.state().health().is_ready());
    assert_eq!(handle.active_connections(), 0);
}
