//! bookshelf-core: in-memory book catalog served over HTTP
//!
//! The catalog is built once at startup and handed to the server, which
//! shares it read-only across every connection.
//!
//! ## Features
//! - `native` - hyper/tokio server (`Server`, `ServerState`)

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod book;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;

#[cfg(feature = "native")]
pub mod server;

// Re-exports
pub use book::Book;
pub use catalog::{fixture_books, Catalog, CatalogLayout};
pub use config::{ServerConfig, HEALTH_PATH, READY_PATH};
pub use error::{Error, Result};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode, JSON_CONTENT_TYPE};

pub use handlers::{BooksHandler, Health, HealthStatus};
pub use middleware::{Middleware, MiddlewareChain};

#[cfg(feature = "native")]
pub use server::{create_optimized_socket, from_hyper_request, to_hyper_response, ConnectionTracker, Server, ServerState};
