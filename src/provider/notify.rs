//! Status push fabric.
//!
//! ```text
//! timer loop ── every interval ──▶ refresh ──▶ push every managed pod
//! script task ── signal() ──▶ [1-slot channel] ──▶ event loop ──▶ push every script pod
//! ```
//!
//! Both loops stop when the engine's cancellation token fires. A producer
//! calling [`Notifier::signal`] waits until the slot is free, so deliveries
//! are serialized while the processes that trigger them keep running.

use super::managed;
use crate::cri::RuntimeClient;
use crate::manager::{PodManager, SandboxRecord};
use crate::pod::Pod;
use crate::project;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Orchestrator-supplied sink for pod status updates.
pub type PodCallback = Arc<dyn Fn(Pod) + Send + Sync>;

/// Holds the push callback and the script-pod signal channel.
pub(crate) struct Notifier {
    callback: RwLock<Option<PodCallback>>,
    signal_tx: mpsc::Sender<()>,
    signal_rx: Mutex<Option<mpsc::Receiver<()>>>,
    listening: AtomicBool,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(1);
        Self {
            callback: RwLock::new(None),
            signal_tx,
            signal_rx: Mutex::new(Some(signal_rx)),
            listening: AtomicBool::new(false),
        }
    }

    /// Installs (or replaces) the push callback.
    pub(crate) fn set_callback(&self, callback: PodCallback) {
        match self.callback.write() {
            Ok(mut guard) => *guard = Some(callback),
            Err(poisoned) => *poisoned.into_inner() = Some(callback),
        }
    }

    /// Hands the signal receiver to the event loop. Only the first caller gets it.
    pub(crate) fn take_receiver(&self) -> Option<mpsc::Receiver<()>> {
        let rx = match self.signal_rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if rx.is_some() {
            self.listening.store(true, Ordering::SeqCst);
        }
        rx
    }

    /// Delivers one pod to the callback, if one is installed.
    pub(crate) fn push(&self, pod: Pod) {
        let callback = match self.callback.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match callback {
            Some(cb) => cb(pod),
            None => tracing::trace!(pod = %pod.key(), "no status callback registered"),
        }
    }

    /// Pushes the projection of each record.
    pub(crate) fn push_records(&self, records: &[SandboxRecord], node_name: &str) {
        for record in records {
            self.push(project::pod_from_record(record, node_name));
        }
    }

    /// Asks the event loop to push every script pod.
    ///
    /// Dropped when no event loop has been started; returns once the signal
    /// is queued otherwise.
    pub(crate) async fn signal(&self) {
        if !self.listening.load(Ordering::SeqCst) {
            return;
        }
        if self.signal_tx.send(()).await.is_err() {
            tracing::debug!("event loop stopped, dropping script pod signal");
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listening", &self.listening.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Periodic refresh of the managed partition followed by a push of every pod in it.
pub(crate) async fn run_timer_loop(
    client: RuntimeClient,
    pods: Arc<PodManager>,
    notifier: Arc<Notifier>,
    node_name: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::debug!(?interval, "status timer loop started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        if let Err(e) = managed::refresh(&client, &pods).await {
            tracing::warn!(error = %e, "status refresh failed");
            continue;
        }
        match pods.managed() {
            Ok(partition) => {
                let records: Vec<_> = partition.values().cloned().collect();
                notifier.push_records(&records, &node_name);
            }
            Err(e) => tracing::warn!(error = %e, "reading managed pods failed"),
        }
    }
    tracing::debug!("status timer loop stopped");
}

/// Pushes every script pod each time a signal arrives.
pub(crate) async fn run_event_loop(
    mut signals: mpsc::Receiver<()>,
    pods: Arc<PodManager>,
    notifier: Arc<Notifier>,
    node_name: String,
    cancel: CancellationToken,
) {
    tracing::debug!("script event loop started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signals.recv() => {
                if signal.is_none() {
                    break;
                }
                match pods.scripted() {
                    Ok(records) => notifier.push_records(&records, &node_name),
                    Err(e) => tracing::warn!(error = %e, "reading script pods failed"),
                }
            }
        }
    }
    tracing::debug!("script event loop stopped");
}
