//! Request handlers
//!
//! The catalog handler serves the book list; the health handler answers
//! liveness and readiness probes.

pub mod books;
pub mod health;

pub use books::BooksHandler;
pub use health::{Health, HealthStatus};
