//! Native HTTP server implementation
//!
//! - Multi-threaded tokio runtime, one task per connection
//! - hyper HTTP/1.1 connections
//! - SO_REUSEPORT and TCP_NODELAY on the listening socket
//! - Graceful shutdown: readiness drops, accepting stops, open connections
//!   get `graceful_shutdown` and a bounded time to finish

use crate::handlers::{BooksHandler, Health};
use crate::middleware::{MiddlewareChain, RequestTracing, RequestTracingConfig};
use crate::{Catalog, Error, Method, Request, Response, Result, ServerConfig, HEALTH_PATH, READY_PATH};
use bookshelf_router::Router;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Handler IDs stored in the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum Route {
    Books = 0,
    Liveness = 1,
    Readiness = 2,
}

impl Route {
    fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Route::Books),
            1 => Some(Route::Liveness),
            2 => Some(Route::Readiness),
            _ => None,
        }
    }
}

/// Everything a request needs, shared across all connections
///
/// Nothing in here is mutated after construction except the readiness flag,
/// so requests run without locks.
pub struct ServerState {
    router: Router,
    books: BooksHandler,
    health: Health,
    middleware: MiddlewareChain,
}

impl ServerState {
    pub fn new(config: &ServerConfig, catalog: Arc<Catalog>) -> Result<Self> {
        config.validate()?;

        let mut router = Router::new();
        router.insert_any(&config.books_path, Route::Books as u32);
        router.insert(Method::Get.as_str(), HEALTH_PATH, Route::Liveness as u32);
        router.insert(Method::Get.as_str(), READY_PATH, Route::Readiness as u32);

        let mut middleware = MiddlewareChain::new();
        middleware.add(RequestTracing::new(
            RequestTracingConfig::new().header_name(config.request_id_header.clone()),
        ));

        Ok(Self {
            router,
            books: BooksHandler::new(catalog),
            health: Health::new(),
            middleware,
        })
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn catalog(&self) -> &Catalog {
        self.books.catalog()
    }

    /// Run one request through middleware, routing and the matched handler
    pub fn handle(&self, mut req: Request) -> Response {
        let mut res = match self.middleware.run_before(&mut req) {
            Some(early) => early,
            None => self.dispatch(&req),
        };
        self.middleware.run_after(&req, &mut res);
        res
    }

    fn dispatch(&self, req: &Request) -> Response {
        if req.method.is_extension() {
            tracing::warn!(method = %req.method, path = %req.path, "unsupported method");
            return Response::error(&Error::InvalidMethod(req.method.to_string()));
        }

        let Some(handler_id) = self.router.find(req.method.as_str(), &req.path) else {
            let allowed = self.router.allowed_methods(&req.path);
            if allowed.is_empty() {
                return Response::not_found(req.method.as_str(), &req.path);
            }
            return Response::error(&Error::MethodNotAllowed {
                method: req.method.to_string(),
                path: req.path.clone(),
                allowed,
            });
        };

        match Route::from_id(handler_id) {
            Some(Route::Books) => self.books.handle(req),
            Some(Route::Liveness) => self.health.liveness(),
            Some(Route::Readiness) => self.health.readiness(),
            None => Response::error(&Error::Internal(format!(
                "no handler registered for id {handler_id}"
            ))),
        }
    }
}

/// Create a TCP socket with optimizations
pub fn create_optimized_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // SO_REUSEADDR - allow binding to address in TIME_WAIT
    socket.set_reuse_address(true)?;

    // SO_REUSEPORT - enable kernel load balancing across processes
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    // TCP_NODELAY - disable Nagle's algorithm for lower latency
    socket.set_nodelay(true)?;

    // tokio requires non-blocking sockets
    socket.set_nonblocking(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// Convert a hyper request to our Request type
///
/// Only the request head is read; no route consumes a body. Method tokens
/// the server does not implement are kept as [`Method::Extension`].
pub fn from_hyper_request<B>(req: &hyper::Request<B>) -> Request {
    let method = Method::from_token(req.method().as_str());
    let uri = req.uri();

    let mut request = Request::new(method, uri.path());
    request.query = uri.query().map(|s| s.to_string());

    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request
}

/// Convert our Response to a hyper Response
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.body(Full::new(res.body)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "response could not be converted");
        let mut fallback = hyper::Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
        *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn handle_hyper_request<B>(state: &ServerState, req: hyper::Request<B>) -> hyper::Response<Full<Bytes>> {
    to_hyper_response(state.handle(from_hyper_request(&req)))
}

/// Pause after a failed accept so fd exhaustion does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

// ============================================================================
// Connection Tracking for Graceful Shutdown
// ============================================================================

/// Tracks active connections for graceful shutdown
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    /// Active connection count
    active: AtomicU64,
    /// Shutdown signal received
    shutting_down: AtomicBool,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn decrement(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Get current active connection count
    #[inline]
    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Signal that shutdown is in progress
    pub fn start_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Wait until no connection is open or `timeout` elapses
    ///
    /// Returns true if every connection closed in time.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.count() == 0 {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Catalog HTTP server
pub struct Server {
    config: ServerConfig,
    state: Arc<ServerState>,
    tracker: Arc<ConnectionTracker>,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    pub fn new(config: ServerConfig, catalog: Arc<Catalog>) -> Result<Self> {
        let state = ServerState::new(&config, catalog)?;
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            state: Arc::new(state),
            tracker: Arc::new(ConnectionTracker::new()),
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn active_connections(&self) -> u64 {
        self.tracker.count()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.tracker.is_shutting_down()
    }

    /// Bind the configured address
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr()?;
        let socket = create_optimized_socket(&addr)?;
        let listener = TcpListener::from_std(socket.into())?;
        Ok(listener)
    }

    /// Accept connections on `listener` until `shutdown` resolves
    ///
    /// Returns once every connection has closed or the shutdown timeout has
    /// passed.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            address = %local_addr,
            books_path = %self.config.books_path,
            layout = %self.state.catalog().layout(),
            books = self.state.catalog().len(),
            "serving catalog"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = &mut shutdown => break,
            }
        }
        drop(listener);

        self.state.health().set_ready(false);
        self.tracker.start_shutdown();
        // Errors only when no connection is subscribed
        let _ = self.shutdown_tx.send(true);

        tracing::info!(active = self.tracker.count(), "shutdown started, draining connections");
        if self.tracker.wait_for_drain(self.config.shutdown_timeout).await {
            tracing::info!("all connections closed");
        } else {
            tracing::warn!(
                remaining = self.tracker.count(),
                timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                "shutdown timeout reached with open connections"
            );
        }

        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let state = self.state.clone();
        let tracker = self.tracker.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tracker.increment();
        tracing::debug!(peer = %peer, active = tracker.count(), "connection opened");

        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(handle_hyper_request(&state, req)) }
            });

            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let mut closing = false;
            loop {
                tokio::select! {
                    result = conn.as_mut() => {
                        if let Err(e) = result {
                            if !e.is_incomplete_message() {
                                tracing::debug!(peer = %peer, error = %e, "connection error");
                            }
                        }
                        break;
                    }
                    _ = shutdown_rx.changed(), if !closing => {
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }

            tracker.decrement();
            tracing::debug!(peer = %peer, "connection closed");
        });
    }
}
