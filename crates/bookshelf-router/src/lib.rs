//! bookshelf-router: Zero-dependency path router
//!
//! Maps `(method, path)` pairs to numeric handler IDs. The server keeps the
//! handlers themselves; the router only decides which one applies.
//!
//! - O(k) lookup where k = number of path segments
//! - Static paths only: `/api/books`, `/healthz`
//! - Any-method routes for handlers that switch on the method themselves
//! - `allowed_methods` so callers can tell "wrong method" from "wrong path"
//!
//! A route registered for the request's own method always beats an
//! any-method route for the same path.
//!
//! ## Example
//! ```
//! use bookshelf_router::Router;
//!
//! let mut router = Router::new();
//! router.insert_any("/api/books", 0);
//! router.insert("GET", "/healthz", 1);
//!
//! assert_eq!(router.find("DELETE", "/api/books"), Some(0));
//! assert_eq!(router.find("DELETE", "/healthz"), None);
//! assert_eq!(router.allowed_methods("/healthz"), vec!["GET".to_string()]);
//! ```

use std::collections::HashMap;

/// Pseudo-method under which any-method routes are stored
pub const ANY_METHOD: &str = "*";

/// Trie node, one per path segment
#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    /// Handler ID if a route ends here
    handler_id: Option<u32>,
}

impl Node {
    fn lookup(&self, segments: &[&str]) -> Option<u32> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
            .and_then(|node| node.handler_id)
    }
}

/// Path router with one trie per HTTP method
#[derive(Debug, Default)]
pub struct Router {
    /// Method -> trie root. Any-method routes live under [`ANY_METHOD`].
    trees: HashMap<String, Node>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route for one method
    ///
    /// Inserting the same method and path twice replaces the handler ID.
    pub fn insert(&mut self, method: &str, path: &str, handler_id: u32) {
        let node = split_path(path)
            .into_iter()
            .fold(self.trees.entry(method.to_uppercase()).or_default(), |node, segment| {
                node.children.entry(segment.to_string()).or_default()
            });
        node.handler_id = Some(handler_id);
    }

    /// Insert a route that answers every method
    pub fn insert_any(&mut self, path: &str, handler_id: u32) {
        self.insert(ANY_METHOD, path, handler_id);
    }

    /// Handler ID for `method` and `path`
    ///
    /// Looks in the tree for `method` first and falls back to the any-method
    /// tree.
    pub fn find(&self, method: &str, path: &str) -> Option<u32> {
        let segments = split_path(path);
        let method = method.to_uppercase();
        let keys = [method.as_str(), ANY_METHOD];

        let found = keys
            .iter()
            .filter_map(|key| self.trees.get(*key))
            .find_map(|tree| tree.lookup(&segments));
        found
    }

    /// Methods that have a route for `path`, sorted
    ///
    /// Any-method routes are not listed: a path served by one already
    /// matches every method through [`Router::find`].
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let segments = split_path(path);
        let mut methods: Vec<String> = self
            .trees
            .iter()
            .filter(|(method, tree)| method.as_str() != ANY_METHOD && tree.lookup(&segments).is_some())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort();
        methods
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
