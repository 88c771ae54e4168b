//! Middleware
//!
//! Middleware sees every request before routing and every response after the
//! handler, whatever the route.

pub mod request_id;

pub use request_id::{generate_uuid, RequestTracing, RequestTracingConfig};

use crate::{Request, Response};

/// Middleware trait - process request/response
pub trait Middleware: Send + Sync {
    /// Process request before handler; returning a response skips the handler
    fn before(&self, req: &mut Request) -> Option<Response>;

    /// Process response after handler
    fn after(&self, req: &Request, res: &mut Response);
}

/// Middleware chain
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run before middlewares, return early response if any
    pub fn run_before(&self, req: &mut Request) -> Option<Response> {
        self.middlewares.iter().find_map(|m| m.before(req))
    }

    /// Run after middlewares in reverse order
    pub fn run_after(&self, req: &Request, res: &mut Response) {
        for m in self.middlewares.iter().rev() {
            m.after(req, res);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, RequestBuilder, StatusCode};
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        short_circuit: bool,
    }

    impl Middleware for Recorder {
        fn before(&self, _req: &mut Request) -> Option<Response> {
            self.log.lock().unwrap().push(format!("before:{}", self.name));
            self.short_circuit
                .then(|| Response::text(StatusCode::SERVICE_UNAVAILABLE, "busy"))
        }

        fn after(&self, _req: &Request, _res: &mut Response) {
            self.log.lock().unwrap().push(format!("after:{}", self.name));
        }
    }

    #[test]
    fn test_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        for name in ["outer", "inner"] {
            chain.add(Recorder { name, log: log.clone(), short_circuit: false });
        }

        let mut req = RequestBuilder::new(Method::Get, "/api/books").build();
        assert!(chain.run_before(&mut req).is_none());
        let mut res = Response::ok();
        chain.run_after(&req, &mut res);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:outer", "before:inner", "after:inner", "after:outer"]
        );
    }

    #[test]
    fn test_short_circuit_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.add(Recorder { name: "gate", log: log.clone(), short_circuit: true });
        chain.add(Recorder { name: "never", log: log.clone(), short_circuit: false });

        let mut req = RequestBuilder::new(Method::Get, "/").build();
        let res = chain.run_before(&mut req).unwrap();

        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(*log.lock().unwrap(), vec!["before:gate"]);
    }
}
