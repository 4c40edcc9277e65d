//! Cleanup units run during shutdown.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// A unit of cleanup work run after listeners have drained.
///
/// Callbacks run concurrently with their siblings under one shared
/// deadline. A callback still running at the deadline is abandoned: it
/// keeps running on a detached task, but shutdown no longer waits for it.
#[async_trait]
pub trait ShutdownCallback: Send + Sync {
    /// Returns the callback name for logging purposes.
    fn name(&self) -> &str;

    /// Run the cleanup work.
    ///
    /// `budget` is the shared deadline for the whole callback stage;
    /// implementations that shell out to slow resources should pass it
    /// along as their own timeout.
    async fn run(&self, budget: Duration);
}

/// Wraps a closure returning a future as a [`ShutdownCallback`].
pub struct FnCallback<F> {
    name: String,
    callback: F,
}

impl<F, Fut> FnCallback<F>
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

#[async_trait]
impl<F, Fut> ShutdownCallback for FnCallback<F>
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, budget: Duration) {
        (self.callback)(budget).await;
    }
}

/// Final teardown unit (cache write-back, storage close).
///
/// Finalizers run sequentially after the callback stage, unconditionally
/// and without a deadline; they are expected to be fast, bounded
/// operations. Failures are logged and do not stop later finalizers.
#[async_trait]
pub trait Finalizer: Send + Sync {
    /// Returns the finalizer name for logging purposes.
    fn name(&self) -> &str;

    /// Run the teardown work.
    async fn finalize(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Wraps a closure returning a fallible future as a [`Finalizer`].
pub struct FnFinalizer<F> {
    name: String,
    finalize_fn: F,
}

impl<F, Fut> FnFinalizer<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send,
{
    pub fn new(name: impl Into<String>, finalize_fn: F) -> Self {
        Self {
            name: name.into(),
            finalize_fn,
        }
    }
}

#[async_trait]
impl<F, Fut> Finalizer for FnFinalizer<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn finalize(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (self.finalize_fn)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fn_callback_runs() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = FnCallback::new("test", move |_budget| {
            let called = called_clone.clone();
            async move {
                called.store(true, Ordering::SeqCst);
            }
        });

        assert_eq!(callback.name(), "test");
        callback.run(Duration::from_secs(1)).await;
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fn_callback_sees_budget() {
        let callback = FnCallback::new("budget", |budget: Duration| async move {
            assert_eq!(budget, Duration::from_secs(3));
        });
        callback.run(Duration::from_secs(3)).await;
    }

    #[tokio::test]
    async fn test_fn_finalizer_propagates_result() {
        let ok = FnFinalizer::new("flush", || async { Ok(()) });
        assert!(ok.finalize().await.is_ok());

        let fail = FnFinalizer::new("close", || async { Err("disk full".into()) });
        let err = fail.finalize().await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
