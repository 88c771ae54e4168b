//! Catalog handler
//!
//! Serves the whole catalog as a JSON array on `GET`. Every other method is
//! answered with 405 and leaves the catalog untouched.

use crate::book::books_to_json;
use crate::{Catalog, Method, Request, Response, StatusCode};
use std::sync::Arc;

/// Methods the catalog route answers
pub const ALLOWED_METHODS: &[&str] = &["GET"];

/// Handler for the catalog route
#[derive(Debug, Clone)]
pub struct BooksHandler {
    catalog: Arc<Catalog>,
}

impl BooksHandler {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Answer one request
    pub fn handle(&self, req: &Request) -> Response {
        match &req.method {
            Method::Get => self.list(),
            method => {
                tracing::debug!(method = %method, path = %req.path, "rejecting non-GET catalog request");
                Response::method_not_allowed(method.as_str(), &req.path, ALLOWED_METHODS)
            }
        }
    }

    fn list(&self) -> Response {
        let books = self.catalog.all_books();
        match books_to_json(&books) {
            Ok(body) => Response::json(StatusCode::OK, body),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode catalog");
                Response::error(&e)
            }
        }
    }
}
