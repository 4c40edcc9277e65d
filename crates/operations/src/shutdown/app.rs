//! The orchestrator: runs listeners and the three-stage shutdown sequence.

use crate::errors::ServeError;
use crate::observability::ShutdownMetrics;
use crate::shutdown::callbacks::{Finalizer, ShutdownCallback};
use crate::shutdown::listener::Listener;
use crate::shutdown::signals::{SignalWatcher, TermSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Default bound on waiting for in-flight requests after reject begins.
pub const DEFAULT_DRAIN_DEADLINE: Duration = Duration::from_secs(10);
/// Default bound on running all shutdown callbacks.
pub const DEFAULT_CALLBACK_DEADLINE: Duration = Duration::from_secs(3);
/// Default bound on the entire shutdown sequence before force-exit.
pub const DEFAULT_ESCALATION_DEADLINE: Duration = Duration::from_secs(30);

/// Orchestrates a set of listeners and their coordinated shutdown.
///
/// On the first termination signal, listener failure, or external
/// cancellation, the shutdown sequence runs exactly once:
///
/// 1. set the reject flag on every listener (synchronous)
/// 2. drain all listeners concurrently under one shared deadline
/// 3. run all shutdown callbacks concurrently under a second deadline
/// 4. run finalizers sequentially, unconditionally
///
/// Each stage completes (or times out) before the next starts; there is no
/// ordering among listeners or among callbacks within a stage.
pub struct App {
    listeners: Vec<Arc<dyn Listener>>,
    callbacks: Vec<Arc<dyn ShutdownCallback>>,
    finalizers: Vec<Arc<dyn Finalizer>>,
    drain_deadline: Duration,
    callback_deadline: Duration,
    watcher: SignalWatcher,
    cancel: watch::Sender<bool>,
    metrics: Option<ShutdownMetrics>,
}

/// Cancels an [`App`]'s serve scope from outside, equivalent to a first
/// termination signal.
#[derive(Clone)]
pub struct ShutdownHandle {
    cancel: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown. One-shot and irreversible; repeat calls are no-ops
    /// as far as the sequence is concerned.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Check whether shutdown has been requested through this handle.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl App {
    /// Create an orchestrator over the given listeners with default
    /// deadlines and the default signal set.
    pub fn new(listeners: Vec<Arc<dyn Listener>>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            listeners,
            callbacks: Vec::new(),
            finalizers: Vec::new(),
            drain_deadline: DEFAULT_DRAIN_DEADLINE,
            callback_deadline: DEFAULT_CALLBACK_DEADLINE,
            watcher: SignalWatcher::new(DEFAULT_ESCALATION_DEADLINE),
            cancel,
            metrics: None,
        }
    }

    /// Set the bound on waiting for in-flight requests after reject begins.
    pub fn with_drain_deadline(mut self, deadline: Duration) -> Self {
        self.drain_deadline = deadline;
        self
    }

    /// Set the bound on running all shutdown callbacks.
    pub fn with_callback_deadline(mut self, deadline: Duration) -> Self {
        self.callback_deadline = deadline;
        self
    }

    /// Set the bound on the entire shutdown sequence before force-exit.
    pub fn with_escalation_deadline(mut self, deadline: Duration) -> Self {
        self.watcher.escalation = deadline;
        self
    }

    /// Set the termination signals to subscribe to.
    pub fn with_signals(mut self, signals: &[TermSignal]) -> Self {
        self.watcher.signals = signals.to_vec();
        self
    }

    /// Replace the signal watcher wholesale.
    pub fn with_signal_watcher(mut self, watcher: SignalWatcher) -> Self {
        self.watcher = watcher;
        self
    }

    /// Register the shutdown callbacks run after the drain stage.
    pub fn with_shutdown_callbacks(mut self, callbacks: Vec<Arc<dyn ShutdownCallback>>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Register the finalizers run after the callback stage.
    pub fn with_finalizers(mut self, finalizers: Vec<Arc<dyn Finalizer>>) -> Self {
        self.finalizers = finalizers;
        self
    }

    /// Record shutdown metrics into the given handle.
    pub fn with_metrics(mut self, metrics: ShutdownMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get a handle for programmatic cancellation.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Start every listener and the signal watcher, then block until the
    /// shutdown sequence has run and all tasks have completed.
    ///
    /// A listener ending with anything other than the distinguished
    /// "closed" condition counts as a failure and cancels the whole scope.
    /// Errors are logged, never returned; on the fatal paths (second
    /// signal, escalation deadline) the process exits directly.
    pub async fn start_and_serve(self) {
        let App {
            listeners,
            callbacks,
            finalizers,
            drain_deadline,
            callback_deadline,
            watcher,
            cancel,
            metrics,
        } = self;

        watcher.install();

        let mut tasks: JoinSet<Result<(), ServeError>> = JoinSet::new();
        for listener in &listeners {
            let listener = Arc::clone(listener);
            tasks.spawn(async move {
                match listener.start().await {
                    // An intentional stop is success, not failure.
                    Err(e) if !e.is_closed() => Err(e),
                    _ => Ok(()),
                }
            });
        }

        let sequence = ShutdownSequence {
            listeners: listeners.clone(),
            callbacks,
            finalizers,
            drain_deadline,
            callback_deadline,
            metrics,
        };
        let cancel_rx = cancel.subscribe();
        tasks.spawn(async move {
            watcher.run(cancel_rx, || sequence.run()).await;
            Ok(())
        });

        let mut logged_failure = false;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("task panicked: {e}")),
            };
            if let Some(reason) = failure {
                if !logged_failure {
                    log::error!("listener failed, shutting down: {}", reason);
                    logged_failure = true;
                }
                let _ = cancel.send(true);
            }
        }

        log::info!("all tasks complete");
    }
}

/// The three-stage sequence, detached from [`App`] so the watcher task can
/// own it. Runs at most once per process by construction: the trigger path
/// that reaches it is one-shot.
struct ShutdownSequence {
    listeners: Vec<Arc<dyn Listener>>,
    callbacks: Vec<Arc<dyn ShutdownCallback>>,
    finalizers: Vec<Arc<dyn Finalizer>>,
    drain_deadline: Duration,
    callback_deadline: Duration,
    metrics: Option<ShutdownMetrics>,
}

impl ShutdownSequence {
    async fn run(self) {
        // Stage 1: reject. Synchronous, so no request reaches dispatch
        // after this point; requests already past the gate continue.
        log::info!(
            "rejecting new requests on {} listener(s)",
            self.listeners.len()
        );
        for listener in &self.listeners {
            listener.reject_new_requests();
        }

        // Stage 2: drain every listener against one shared deadline.
        let started = Instant::now();
        let deadline = started + self.drain_deadline;
        let mut stops = JoinSet::new();
        for listener in &self.listeners {
            let listener = Arc::clone(listener);
            stops.spawn(async move { listener.stop(deadline).await });
        }
        let abandoned = join_within(stops, deadline, "listener stop(s)").await;
        if let Some(metrics) = &self.metrics {
            metrics.record_drain(started.elapsed().as_secs_f64(), abandoned);
        }
        log::info!("all listeners stopped");

        // Stage 3: callbacks, one shared deadline independent of drain.
        let started = Instant::now();
        let deadline = started + self.callback_deadline;
        let mut invocations = JoinSet::new();
        for callback in &self.callbacks {
            let callback = Arc::clone(callback);
            let budget = self.callback_deadline;
            invocations.spawn(async move {
                log::debug!("running shutdown callback '{}'", callback.name());
                callback.run(budget).await;
            });
        }
        let abandoned = join_within(invocations, deadline, "shutdown callback(s)").await;
        if let Some(metrics) = &self.metrics {
            metrics.record_callbacks(started.elapsed().as_secs_f64(), abandoned);
        }
        log::info!("all shutdown callbacks finished");

        // Stage 4: finalization, sequential and unconditional. Failures are
        // logged and do not stop later finalizers.
        for finalizer in &self.finalizers {
            match finalizer.finalize().await {
                Ok(()) => log::info!("finalizer '{}' complete", finalizer.name()),
                Err(e) => log::warn!("finalizer '{}' failed: {}", finalizer.name(), e),
            }
        }

        log::info!("shutdown sequence complete");
    }
}

/// Wait for every task in the set, or until `deadline`.
///
/// Tasks still running at the deadline are detached, not cancelled: they
/// keep running in the background but shutdown no longer waits for them.
/// Returns the number of abandoned tasks.
async fn join_within(mut set: JoinSet<()>, deadline: Instant, what: &str) -> u64 {
    loop {
        tokio::select! {
            joined = set.join_next() => match joined {
                None => return 0,
                Some(Ok(())) => {}
                Some(Err(e)) => log::warn!("{} task failed: {}", what, e),
            },
            () = tokio::time::sleep_until(deadline) => {
                let abandoned = set.len() as u64;
                log::warn!("{} {} still running at deadline, abandoning", abandoned, what);
                set.detach_all();
                return abandoned;
            }
        }
    }
}
