//! Exact-path request routing.
//!
//! Dispatch is deliberately minimal: handlers register under an exact path
//! and unknown paths get 404. Anything richer belongs to the application
//! behind the listener, not to the lifecycle wrapper.

use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// A registered dispatch target.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>>;
}

/// Wraps a closure returning a future as a [`Handler`].
pub struct FnHandler<F> {
    handler: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(Request<Incoming>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Full<Bytes>>> + Send,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request<Incoming>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Full<Bytes>>> + Send,
{
    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        (self.handler)(req).await
    }
}

/// Exact-path router over the registered handlers.
#[derive(Clone, Default)]
pub struct Router {
    routes: Arc<HashMap<String, Arc<dyn Handler>>>,
}

impl Router {
    pub fn new(routes: HashMap<String, Arc<dyn Handler>>) -> Self {
        Self {
            routes: Arc::new(routes),
        }
    }

    /// Whether a handler is registered for the exact path.
    pub fn has_route(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }
}

impl Service<Request<Incoming>> for Router {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Incoming>) -> Self::Future {
        let handler = self.routes.get(req.uri().path()).cloned();
        Box::pin(async move {
            match handler {
                Some(handler) => Ok(handler.handle(req).await),
                None => Ok(not_found()),
            }
        })
    }
}

fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(b"not found\n")))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl Handler for NoopHandler {
        async fn handle(&self, _req: Request<Incoming>) -> Response<Full<Bytes>> {
            Response::new(Full::new(Bytes::from_static(b"ok")))
        }
    }

    #[test]
    fn test_route_lookup_is_exact() {
        let mut routes: HashMap<String, Arc<dyn Handler>> = HashMap::new();
        routes.insert("/orders".to_string(), Arc::new(NoopHandler));
        let router = Router::new(routes);

        assert!(router.has_route("/orders"));
        assert!(!router.has_route("/orders/"));
        assert!(!router.has_route("/order"));
    }

    #[test]
    fn test_not_found_shape() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
