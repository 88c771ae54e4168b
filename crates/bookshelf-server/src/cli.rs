use crate::logger::LogFormat;
use bookshelf_core::{CatalogLayout, ServerConfig};
use clap::Parser;
use std::time::Duration;

/// Every flag can also be set through its `BOOKSHELF_*` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "bookshelf-server")]
#[command(about = "Serve the book catalog as JSON over HTTP", version)]
pub struct Args {
    #[arg(long, env = "BOOKSHELF_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "BOOKSHELF_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Runtime worker threads (defaults to the number of CPUs)
    #[arg(long, env = "BOOKSHELF_WORKERS")]
    pub workers: Option<usize>,

    /// Route serving the catalog
    #[arg(long, env = "BOOKSHELF_BOOKS_PATH", default_value = "/api/books")]
    pub books_path: String,

    /// Catalog storage: `sequence` (definition order) or `keyed` (by ISBN)
    #[arg(long, env = "BOOKSHELF_CATALOG_LAYOUT", default_value = "keyed")]
    pub catalog_layout: CatalogLayout,

    #[arg(long, env = "BOOKSHELF_REQUEST_ID_HEADER", default_value = "X-Request-ID")]
    pub request_id_header: String,

    /// Milliseconds to wait for open connections on shutdown
    #[arg(long, env = "BOOKSHELF_SHUTDOWN_TIMEOUT_MS", default_value_t = 5000)]
    pub shutdown_timeout_ms: u64,

    #[arg(short, long, env = "BOOKSHELF_VERBOSE", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, env = "BOOKSHELF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            hostname: self.host.clone(),
            port: self.port,
            workers: self.workers.unwrap_or(defaults.workers),
            books_path: self.books_path.clone(),
            catalog_layout: self.catalog_layout,
            request_id_header: self.request_id_header.clone(),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }
}
