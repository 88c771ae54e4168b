//! Health check handler
//!
//! Provides liveness and readiness probes.

use crate::{Response, StatusCode};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Alive,
    Ready,
    NotReady,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Alive => "alive",
            HealthStatus::Ready => "ready",
            HealthStatus::NotReady => "not_ready",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Alive | HealthStatus::Ready => StatusCode::OK,
            HealthStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            status: &'static str,
        }

        Response::json_value(self.status_code(), &Body { status: self.as_str() })
    }
}

/// Health handler
///
/// Cloning shares the readiness flag, so the server can flip it during
/// shutdown while probes keep reading it.
#[derive(Debug, Clone)]
pub struct Health {
    ready: Arc<AtomicBool>,
}

impl Health {
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Get ready state
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Liveness probe - is the server alive?
    pub fn liveness(&self) -> Response {
        HealthStatus::Alive.response()
    }

    /// Readiness probe - is the server accepting traffic?
    pub fn readiness(&self) -> Response {
        if self.is_ready() {
            HealthStatus::Ready.response()
        } else {
            HealthStatus::NotReady.response()
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}
