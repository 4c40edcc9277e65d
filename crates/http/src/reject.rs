//! Tower middleware implementing the reject gate.
//!
//! Once the gate is closed, every inbound request is answered with 503 and
//! a short plain-text body before it can reach routing or handler logic.
//! The gate is a one-shot atomic flag read on the request hot path, so no
//! lock is taken per request.

use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use prometheus_client::metrics::counter::Counter;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

const REJECT_BODY: &[u8] = b"service is shutting down\n";

/// Tower layer that installs the reject gate in front of a service.
#[derive(Clone)]
pub struct RejectLayer {
    reject: Arc<AtomicBool>,
    rejected_total: Option<Counter>,
}

impl RejectLayer {
    /// Create a gate over the given flag.
    pub fn new(reject: Arc<AtomicBool>) -> Self {
        Self {
            reject,
            rejected_total: None,
        }
    }

    /// Create a gate that also counts refused requests.
    pub fn with_counter(reject: Arc<AtomicBool>, rejected_total: Counter) -> Self {
        Self {
            reject,
            rejected_total: Some(rejected_total),
        }
    }
}

impl<S> Layer<S> for RejectLayer {
    type Service = RejectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RejectService {
            inner,
            reject: self.reject.clone(),
            rejected_total: self.rejected_total.clone(),
        }
    }
}

/// Tower service that refuses requests once the gate is closed.
#[derive(Clone)]
pub struct RejectService<S> {
    inner: S,
    reject: Arc<AtomicBool>,
    rejected_total: Option<Counter>,
}

impl<S, B> Service<Request<B>> for RejectService<S>
where
    S: Service<Request<B>, Response = Response<Full<Bytes>>>,
    S::Future: Send + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if self.reject.load(Ordering::SeqCst) {
            if let Some(counter) = &self.rejected_total {
                counter.inc();
            }
            let response = Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(Full::new(Bytes::from_static(REJECT_BODY)))
                .unwrap();
            return Box::pin(async move { Ok(response) });
        }

        Box::pin(self.inner.call(req))
    }
}
