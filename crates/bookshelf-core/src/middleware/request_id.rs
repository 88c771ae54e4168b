//! Request tracing middleware
//!
//! Attaches a request ID to every request, echoes it on the response, and
//! logs both ends of the exchange.

use super::Middleware;
use crate::{Request, Response};

/// Request tracing configuration
#[derive(Debug, Clone)]
pub struct RequestTracingConfig {
    /// Header name for request ID
    pub header_name: String,
    /// Generate request ID if not present
    pub generate_id: bool,
    /// Log each request and response
    pub log_requests: bool,
}

impl Default for RequestTracingConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Request-ID".to_string(),
            generate_id: true,
            log_requests: true,
        }
    }
}

impl RequestTracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn generate_id(mut self, generate: bool) -> Self {
        self.generate_id = generate;
        self
    }

    pub fn log_requests(mut self, log: bool) -> Self {
        self.log_requests = log;
        self
    }
}

/// Generate UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Request tracing middleware
#[derive(Debug, Clone, Default)]
pub struct RequestTracing {
    config: RequestTracingConfig,
}

impl RequestTracing {
    pub fn new(config: RequestTracingConfig) -> Self {
        Self { config }
    }

}

impl Middleware for RequestTracing {
    fn before(&self, req: &mut Request) -> Option<Response> {
        req.request_id = req
            .header(&self.config.header_name)
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
            .or_else(|| self.config.generate_id.then(generate_uuid));

        if self.config.log_requests {
            tracing::info!(
                request_id = req.request_id.as_deref().unwrap_or("-"),
                method = %req.method,
                path = %req.path,
                query = req.query.as_deref().unwrap_or(""),
                "request received"
            );
        }

        None
    }

    fn after(&self, req: &Request, res: &mut Response) {
        if let Some(id) = &req.request_id {
            res.headers.push((self.config.header_name.clone(), id.clone()));
        }

        if self.config.log_requests {
            let elapsed_ms = req.received_at.elapsed().as_secs_f64() * 1000.0;
            tracing::info!(
                request_id = req.request_id.as_deref().unwrap_or("-"),
                method = %req.method,
                path = %req.path,
                status = res.status.as_u16(),
                elapsed_ms,
                "response sent"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, RequestBuilder};

    #[test]
    fn test_uuid_format() {
        let uuid = generate_uuid();
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_incoming_id_is_echoed() {
        let middleware = RequestTracing::default();
        let mut req = RequestBuilder::new(Method::Get, "/api/books")
            .header("x-request-id", "client-42")
            .build();

        assert!(middleware.before(&mut req).is_none());
        assert_eq!(req.request_id.as_deref(), Some("client-42"));

        let mut res = Response::ok();
        middleware.after(&req, &mut res);
        assert_eq!(res.header("X-Request-ID"), Some("client-42"));
    }

    #[test]
    fn test_missing_id_is_generated() {
        let middleware = RequestTracing::new(
            RequestTracingConfig::new()
                .header_name("X-Correlation-ID")
                .log_requests(false),
        );
        let mut req = RequestBuilder::new(Method::Get, "/api/books").build();
        middleware.before(&mut req);

        let id = req.request_id.clone().unwrap();
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 4);
        let mut res = Response::ok();
        middleware.after(&req, &mut res);
        assert_eq!(res.header("x-correlation-id"), Some(id.as_str()));
    }

    #[test]
    fn test_generation_disabled() {
        let middleware = RequestTracing::new(RequestTracingConfig::new().generate_id(false));
        let mut req = RequestBuilder::new(Method::Get, "/api/books").build();
        middleware.before(&mut req);
        assert!(req.request_id.is_none());

        let mut res = Response::ok();
        middleware.after(&req, &mut res);
        assert!(res.header("X-Request-ID").is_none());
    }
}
