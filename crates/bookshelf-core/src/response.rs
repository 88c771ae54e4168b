//! HTTP Response types

use crate::Error;
use http::header::{ALLOW, CONTENT_TYPE};
use serde::Serialize;
use smallvec::SmallVec;

/// Content type of every JSON body the server writes
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    // 2xx Success
    pub const OK: StatusCode = StatusCode(200);

    // 4xx Client Errors
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);

    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }

    /// Check if this is a success status (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Check if this is a client error status (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Check if this is a server error status (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Body written for every error response
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 8]>,
    /// Response body
    pub body: bytes::Bytes,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: bytes::Bytes::new(),
        }
    }

    /// Create a 200 OK response
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a JSON response from an already encoded body
    pub fn json(status: StatusCode, body: impl Into<bytes::Bytes>) -> Self {
        ResponseBuilder::new(status)
            .header(CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)
            .body(body)
            .build()
    }

    /// Encode `value` and wrap it in a JSON response
    ///
    /// An encoding failure becomes a 500 error response.
    pub fn json_value<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::json(status, body),
            Err(e) => Self::error(&Error::Encode(e)),
        }
    }

    /// Create a plain text response
    pub fn text(status: StatusCode, body: impl Into<bytes::Bytes>) -> Self {
        ResponseBuilder::new(status)
            .header(CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
            .body(body)
            .build()
    }

    /// Render an error as a JSON body with the matching status
    ///
    /// `MethodNotAllowed` also carries an `Allow` header.
    pub fn error(err: &Error) -> Self {
        let status = err.status_code();
        let body = ErrorBody {
            error: status.reason_phrase(),
            message: err.to_string(),
        };

        let mut response = match serde_json::to_vec(&body) {
            Ok(bytes) => Self::json(status, bytes),
            Err(_) => Self::text(status, body.message),
        };

        if let Error::MethodNotAllowed { allowed, .. } = err {
            response
                .headers
                .push((ALLOW.as_str().to_string(), allowed.join(", ")));
        }

        response
    }

    /// Create a 404 Not Found response
    pub fn not_found(method: &str, path: &str) -> Self {
        Self::error(&Error::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        })
    }

    /// Create a 405 Method Not Allowed response listing `allowed`
    pub fn method_not_allowed(method: &str, path: &str, allowed: &[&str]) -> Self {
        Self::error(&Error::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
            allowed: allowed.iter().map(|m| m.to_string()).collect(),
        })
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Get body as string (if UTF-8)
    pub fn body_string(&self) -> Option<String> {
        std::str::from_utf8(&self.body).ok().map(|s| s.to_string())
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

/// Builder for constructing responses
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Create a new builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Build the response
    pub fn build(self) -> Response {
        self.response
    }
}
