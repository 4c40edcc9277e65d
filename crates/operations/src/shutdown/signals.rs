//! Termination-signal capture with force-exit escalation.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Termination signals the watcher can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// SIGINT (Ctrl-C in a terminal).
    Interrupt,
    /// SIGQUIT.
    Quit,
    /// SIGTERM (default kill signal, used by systemd/Kubernetes).
    Terminate,
}

/// Signals subscribed to when none are configured explicitly.
pub const DEFAULT_SIGNALS: &[TermSignal] = &[
    TermSignal::Interrupt,
    TermSignal::Quit,
    TermSignal::Terminate,
];

/// Watches for termination signals and raises a one-shot shutdown trigger.
///
/// The watcher escalates in two ways, both ending the process immediately
/// with a non-zero status and skipping all remaining cleanup:
/// - a second termination signal while shutdown is in progress (operator
///   override of a stuck graceful path)
/// - the shutdown sequence exceeding the escalation deadline
///
/// The trigger is a watch channel: it fires exactly once and is safe to
/// observe after the fact, so late subscribers still wake.
pub struct SignalWatcher {
    trigger_tx: watch::Sender<bool>,
    pub(crate) escalation: Duration,
    pub(crate) signals: Vec<TermSignal>,
}

impl SignalWatcher {
    /// Create a watcher for the default signal set.
    pub fn new(escalation: Duration) -> Self {
        Self::with_signals(escalation, DEFAULT_SIGNALS)
    }

    /// Create a watcher for a specific signal set.
    pub fn with_signals(escalation: Duration, signals: &[TermSignal]) -> Self {
        let (trigger_tx, _) = watch::channel(false);
        Self {
            trigger_tx,
            escalation,
            signals: signals.to_vec(),
        }
    }

    /// Start listening for termination signals.
    ///
    /// Spawns a background task. The first signal raises the trigger; a
    /// second signal forces an immediate hard exit.
    pub fn install(&self) {
        let tx = self.trigger_tx.clone();
        let signals = self.signals.clone();

        tokio::spawn(async move {
            let mut streams = SignalStreams::subscribe(&signals);

            let first = streams.recv().await;
            log::info!("received {}, beginning graceful shutdown", first);
            let _ = tx.send(true);

            let second = streams.recv().await;
            log::error!("received second signal ({}), forcing immediate exit", second);
            std::process::exit(1);
        });
    }

    /// Manually raise the trigger (programmatic shutdown, tests).
    pub fn trigger(&self) {
        let _ = self.trigger_tx.send(true);
    }

    /// Get a receiver that resolves once the trigger has been raised.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.trigger_tx.subscribe()
    }

    /// Check whether the trigger has been raised.
    pub fn is_triggered(&self) -> bool {
        *self.trigger_tx.borrow()
    }

    /// Wait for the trigger or external cancellation, then run the shutdown
    /// future under the escalation deadline.
    ///
    /// If the shutdown future has not completed when the deadline fires,
    /// the process is terminated with `std::process::exit(1)`, deliberately
    /// skipping destructors. This function never returns an error; its only
    /// outcomes are "shutdown completed" or "process terminated".
    pub async fn run<F, Fut>(&self, mut cancel: watch::Receiver<bool>, on_shutdown: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut trigger = self.subscribe();

        // A closed channel counts as fired: the sender going away means the
        // process is tearing down anyway.
        tokio::select! {
            _ = trigger.wait_for(|&fired| fired) => {
                log::info!("shutdown trigger received");
            }
            _ = cancel.wait_for(|&cancelled| cancelled) => {
                log::info!("shutdown requested by cancellation");
            }
        }

        tokio::select! {
            () = on_shutdown() => {}
            () = tokio::time::sleep(self.escalation) => {
                log::error!(
                    "shutdown did not complete within {:?}, forcing exit",
                    self.escalation
                );
                std::process::exit(1);
            }
        }
    }
}

/// Subscribed OS signal streams.
#[cfg(unix)]
struct SignalStreams {
    interrupt: Option<tokio::signal::unix::Signal>,
    quit: Option<tokio::signal::unix::Signal>,
    terminate: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl SignalStreams {
    fn subscribe(signals: &[TermSignal]) -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let want = |s: TermSignal| signals.contains(&s);
        Self {
            interrupt: want(TermSignal::Interrupt)
                .then(|| signal(SignalKind::interrupt()).expect("failed to register SIGINT handler")),
            quit: want(TermSignal::Quit)
                .then(|| signal(SignalKind::quit()).expect("failed to register SIGQUIT handler")),
            terminate: want(TermSignal::Terminate)
                .then(|| signal(SignalKind::terminate()).expect("failed to register SIGTERM handler")),
        }
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = recv_or_pending(&mut self.interrupt) => "SIGINT",
            _ = recv_or_pending(&mut self.quit) => "SIGQUIT",
            _ = recv_or_pending(&mut self.terminate) => "SIGTERM",
        }
    }
}

#[cfg(unix)]
async fn recv_or_pending(stream: &mut Option<tokio::signal::unix::Signal>) {
    match stream {
        Some(signal) => {
            signal.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// On non-Unix platforms only Ctrl+C is available.
#[cfg(not(unix))]
struct SignalStreams;

#[cfg(not(unix))]
impl SignalStreams {
    fn subscribe(_signals: &[TermSignal]) -> Self {
        Self
    }

    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl+C"
    }
}
