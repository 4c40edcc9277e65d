//! The managed HTTP server.

use crate::reject::RejectLayer;
use crate::router::{Handler, Router};
use async_trait::async_trait;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use prometheus_client::metrics::counter::Counter;
use quiesce_operations::{Listener, ServeError};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;
use tower::Layer;

/// One managed HTTP listener.
///
/// Wraps a TCP accept loop and a hyper connection builder. Every accepted
/// connection is tracked by a [`GracefulShutdown`] watcher so `stop` can
/// wait for in-flight requests; every request passes the reject gate
/// before it reaches the router.
pub struct HttpServer {
    name: String,
    addr: SocketAddr,
    routes: HashMap<String, Arc<dyn Handler>>,
    reject: Arc<AtomicBool>,
    rejected_total: Option<Counter>,
    stop: watch::Sender<bool>,
    bound: watch::Sender<Option<SocketAddr>>,
    graceful: Mutex<Option<GracefulShutdown>>,
}

impl HttpServer {
    /// Create a server for `addr`. Port 0 binds an ephemeral port; see
    /// [`HttpServer::bound_addr`].
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        let (stop, _) = watch::channel(false);
        let (bound, _) = watch::channel(None);
        Self {
            name: name.into(),
            addr,
            routes: HashMap::new(),
            reject: Arc::new(AtomicBool::new(false)),
            rejected_total: None,
            stop,
            bound,
            graceful: Mutex::new(Some(GracefulShutdown::new())),
        }
    }

    /// Register a dispatch target for an exact path.
    pub fn handle(&mut self, pattern: impl Into<String>, handler: Arc<dyn Handler>) {
        self.routes.insert(pattern.into(), handler);
    }

    /// Count refused requests into the given counter.
    pub fn with_rejected_counter(mut self, counter: Counter) -> Self {
        self.rejected_total = Some(counter);
        self
    }

    /// The bound address, once the listener has bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Wait until the listener has bound and return its address.
    ///
    /// Returns `None` only if the server was dropped before binding.
    pub async fn bound_addr(&self) -> Option<SocketAddr> {
        let mut rx = self.bound.subscribe();
        let result = match rx.wait_for(|addr| addr.is_some()).await {
            Ok(addr) => *addr,
            Err(_) => None,
        };
        result
    }
}

#[async_trait]
impl Listener for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), ServeError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServeError::Bind {
                addr: self.addr,
                source: e,
            })?;
        let local = listener.local_addr().map_err(|e| ServeError::Bind {
            addr: self.addr,
            source: e,
        })?;
        let _ = self.bound.send(Some(local));
        log::info!("listener '{}' accepting connections on {}", self.name, local);

        let router = Router::new(self.routes.clone());
        let gate = match &self.rejected_total {
            Some(counter) => RejectLayer::with_counter(Arc::clone(&self.reject), counter.clone()),
            None => RejectLayer::new(Arc::clone(&self.reject)),
        };
        let service = TowerToHyperService::new(gate.layer(router));
        let builder = auto::Builder::new(TokioExecutor::new());

        let mut stop_rx = self.stop.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, _peer) = accepted.map_err(|e| ServeError::Accept {
                        name: self.name.clone(),
                        source: e,
                    })?;
                    let io = TokioIo::new(stream);
                    let conn = builder.serve_connection(io, service.clone()).into_owned();

                    // A connection racing the stop signal is dropped
                    // unserved; the gate would refuse it anyway.
                    let watched = self.graceful.lock().unwrap().as_ref().map(|g| g.watch(conn));
                    let Some(watched) = watched else { continue };

                    let name = self.name.clone();
                    tokio::spawn(async move {
                        if let Err(e) = watched.await {
                            log::debug!("listener '{}' connection error: {}", name, e);
                        }
                    });
                }
                _ = stop_rx.wait_for(|&stopped| stopped) => {
                    log::info!("listener '{}' stopped accepting", self.name);
                    return Err(ServeError::Closed);
                }
            }
        }
    }

    fn reject_new_requests(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    async fn stop(&self, deadline: Instant) {
        log::info!("listener '{}' is stopping", self.name);
        let _ = self.stop.send(true);

        let graceful = self.graceful.lock().unwrap().take();
        let Some(graceful) = graceful else { return };

        match tokio::time::timeout_at(deadline, graceful.shutdown()).await {
            Ok(()) => log::info!("listener '{}' drained", self.name),
            Err(_) => log::warn!(
                "listener '{}' drain deadline expired, abandoning in-flight connections",
                self.name
            ),
        }
    }
}
