//! Server configuration

use crate::{CatalogLayout, Error, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Liveness probe route
pub const HEALTH_PATH: &str = "/healthz";
/// Readiness probe route
pub const READY_PATH: &str = "/readyz";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Runtime worker threads
    pub workers: usize,
    /// Route serving the catalog
    pub books_path: String,
    pub catalog_layout: CatalogLayout,
    /// Header carrying the request ID in both directions
    pub request_id_header: String,
    /// How long shutdown waits for open connections to finish
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 3000,
            workers: num_cpus::get(),
            books_path: "/api/books".to_string(),
            catalog_layout: CatalogLayout::default(),
            request_id_header: "X-Request-ID".to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Resolve `hostname:port` to the first matching socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::config("hostname", format!("cannot resolve '{}': {}", self.hostname, e)))?
            .next()
            .ok_or_else(|| Error::config("hostname", format!("'{}' resolved to no address", self.hostname)))
    }

    /// Check values that would otherwise fail later at startup
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::config("hostname", "cannot be empty"));
        }

        if self.workers == 0 {
            return Err(Error::config("workers", "must be at least 1"));
        }

        if !self.books_path.starts_with('/') {
            return Err(Error::config(
                "books_path",
                format!("'{}' must start with '/'", self.books_path),
            ));
        }

        if self
            .books_path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(Error::config(
                "books_path",
                format!("'{}' must be a static path", self.books_path),
            ));
        }

        let normalized = normalize(&self.books_path);
        if normalized.is_empty() || [HEALTH_PATH, READY_PATH].iter().any(|p| normalize(p) == normalized) {
            return Err(Error::config(
                "books_path",
                format!("'{}' collides with a built-in route", self.books_path),
            ));
        }

        if http::HeaderName::from_bytes(self.request_id_header.as_bytes()).is_err() {
            return Err(Error::config(
                "request_id_header",
                format!("'{}' is not a valid header name", self.request_id_header),
            ));
        }

        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 3000);
        assert_eq!(config.books_path, "/api/books");
        assert_eq!(config.catalog_layout, CatalogLayout::Keyed);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_books_path_rules() {
        for bad in ["api/books", "/", "//", "/healthz", "/readyz/", "/api/:isbn", "/api/*"] {
            let config = ServerConfig {
                books_path: bad.to_string(),
                ..ServerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::Config { ref field, .. }) if field == "books_path"),
                "{bad} should be rejected"
            );
        }

        let config = ServerConfig {
            books_path: "/v1/books/".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_workers_and_header() {
        let config = ServerConfig {
            workers: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            request_id_header: "bad header".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            hostname: "127.0.0.1".to_string(),
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
    }
}
