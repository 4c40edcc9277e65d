//! Listener capability trait.

use crate::errors::ServeError;
use async_trait::async_trait;
use tokio::time::Instant;

/// A managed network listener.
///
/// Implementations wrap one listening socket and its accept loop. The
/// orchestrator runs every listener concurrently and drives all of them
/// through the same lifecycle: serve, reject, drain, stop.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Diagnostic name, used in logs only.
    fn name(&self) -> &str;

    /// Accept and serve connections until stopped or failed.
    ///
    /// Returns [`ServeError::Closed`] when the listener was stopped as part
    /// of an intentional shutdown; any other error means the listener
    /// failed and the whole process should begin shutting down.
    async fn start(&self) -> Result<(), ServeError>;

    /// Stop accepting new requests, effective immediately.
    ///
    /// One-shot and idempotent. Requests already past the gate continue;
    /// every request evaluated after this call is refused before dispatch.
    fn reject_new_requests(&self);

    /// Stop the listener and wait for in-flight work, bounded by `deadline`.
    ///
    /// On deadline expiry the listener is still instructed to close, but
    /// completion of in-flight work is no longer awaited.
    async fn stop(&self, deadline: Instant);
}
