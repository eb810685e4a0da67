//! Reconciliation engine.
//!
//! [`CriProvider`] is the surface the orchestrator framework drives. Every
//! pod is classified once by [`PodKind`] and handed to one backing
//! mechanism:
//!
//! | Kind       | Backing                  | Cache partition | Status delivery       |
//! |------------|--------------------------|-----------------|-----------------------|
//! | `Managed`  | runtime sandbox + RPCs   | managed         | timer loop            |
//! | `Scripted` | local OS process per ctr | scripted        | event loop (signals)  |
//!
//! Read paths (`get_pod`, `get_pod_status`, `get_pods`) refresh the managed
//! partition from the runtime first and then search both partitions.
//!
//! ## Directory Layout
//!
//! ```text
//! {podLogRoot}/{uid}/{container}-{attempt}.log
//! {podVolRoot}/{uid}/
//! ```

mod managed;
mod notify;
mod scripted;

pub use notify::PodCallback;

use crate::config::ProviderConfig;
use crate::constants::{POD_LOG_ROOT_PERMS, POD_VOL_ROOT_PERMS};
use crate::cri::RuntimeClient;
use crate::error::{Error, Result};
use crate::manager::{PodManager, SandboxRecord};
use crate::node::{self, Node};
use crate::pod::{Pod, PodKind, PodStatus};
use crate::project;
use notify::Notifier;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Options for [`CriProvider::container_logs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Only return the last N lines.
    pub tail_lines: Option<usize>,
}

/// Virtual node provider backed by a container runtime.
pub struct CriProvider {
    config: ProviderConfig,
    client: RuntimeClient,
    pods: Arc<PodManager>,
    notifier: Arc<Notifier>,
    /// Engine-wide shutdown signal; parent of every other token.
    cancel: CancellationToken,
    /// Pod UID → token cancelling that pod's script processes.
    script_tasks: Mutex<HashMap<String, CancellationToken>>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl CriProvider {
    /// Creates a provider and its per-pod directory roots.
    ///
    /// The client's deadline is replaced by the configured RPC timeout and its
    /// calls are tied to the provider's shutdown.
    ///
    /// # Errors
    ///
    /// - Configuration fails validation
    /// - A directory root cannot be created
    pub fn new(config: ProviderConfig, client: RuntimeClient) -> Result<Self> {
        config.validate()?;
        ensure_dir(&config.pod_log_root, POD_LOG_ROOT_PERMS)?;
        ensure_dir(&config.pod_vol_root, POD_VOL_ROOT_PERMS)?;

        let cancel = CancellationToken::new();
        let client = client
            .with_timeout(config.rpc_timeout())
            .with_cancellation(cancel.child_token());

        tracing::info!(
            node = %config.node_name,
            log_root = %config.pod_log_root.display(),
            vol_root = %config.pod_vol_root.display(),
            "CRI provider initialized"
        );

        Ok(Self {
            config,
            client,
            pods: Arc::new(PodManager::new()),
            notifier: Arc::new(Notifier::new()),
            cancel,
            script_tasks: Mutex::new(HashMap::new()),
            loops: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Shared handle to the state cache.
    pub fn pod_manager(&self) -> Arc<PodManager> {
        Arc::clone(&self.pods)
    }

    /// Token that fires when the provider shuts down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // =========================================================================
    // Pod Lifecycle
    // =========================================================================

    /// Realizes a pod on this node.
    ///
    /// # Errors
    ///
    /// - Refresh, image pull, or any sandbox/container RPC fails
    /// - Pod directories cannot be created
    pub async fn create_pod(&self, pod: &Pod) -> Result<()> {
        let kind = PodKind::of(pod);
        tracing::info!(pod = %pod.key(), uid = %pod.uid(), %kind, "creating pod");
        match kind {
            PodKind::Managed => self.create_managed(pod).await,
            PodKind::Scripted => self.create_scripted(pod).await,
        }
    }

    /// Accepted and ignored; pods are immutable once created.
    pub async fn update_pod(&self, pod: &Pod) -> Result<()> {
        tracing::debug!(pod = %pod.key(), "ignoring pod update");
        Ok(())
    }

    /// Tears a pod down.
    ///
    /// # Errors
    ///
    /// - No cached record for the pod's UID
    /// - Refresh or sandbox removal fails (managed pods)
    pub async fn delete_pod(&self, pod: &Pod) -> Result<()> {
        let kind = PodKind::of(pod);
        tracing::info!(pod = %pod.key(), uid = %pod.uid(), %kind, "deleting pod");
        match kind {
            PodKind::Managed => self.delete_managed(pod).await,
            PodKind::Scripted => self.delete_scripted(pod),
        }
    }

    // =========================================================================
    // Read Paths
    // =========================================================================

    /// Current view of one pod.
    ///
    /// # Errors
    ///
    /// - Refresh fails
    /// - Pod is not cached in either partition
    pub async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        let record = self.lookup(namespace, name).await?;
        Ok(project::pod_from_record(&record, &self.config.node_name))
    }

    /// Current status of one pod.
    ///
    /// # Errors
    ///
    /// Same as [`CriProvider::get_pod`].
    pub async fn get_pod_status(&self, namespace: &str, name: &str) -> Result<PodStatus> {
        let record = self.lookup(namespace, name).await?;
        Ok(project::pod_status(&record))
    }

    /// Every pod on the node, runtime-backed then script-backed.
    ///
    /// # Errors
    ///
    /// - Refresh fails
    pub async fn get_pods(&self) -> Result<Vec<Pod>> {
        self.refresh_node_state().await?;
        Ok(self
            .pods
            .all()?
            .iter()
            .map(|r| project::pod_from_record(r, &self.config.node_name))
            .collect())
    }

    /// Rebuilds the managed partition from a live runtime listing.
    ///
    /// # Errors
    ///
    /// - Any listing or status RPC fails; the cache is left untouched
    pub async fn refresh_node_state(&self) -> Result<()> {
        managed::refresh(&self.client, &self.pods).await
    }

    async fn lookup(&self, namespace: &str, name: &str) -> Result<SandboxRecord> {
        self.refresh_node_state().await?;
        self.pods
            .find_by_name(namespace, name)?
            .ok_or_else(|| Error::PodNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Output of one container.
    ///
    /// Script containers return their captured output; runtime containers
    /// are read from their log file.
    ///
    /// # Errors
    ///
    /// - Pod or container is not cached
    /// - Log file cannot be read
    pub async fn container_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        container: &str,
        opts: &LogOptions,
    ) -> Result<String> {
        let container_not_found = || Error::ContainerNotFound {
            namespace: namespace.to_string(),
            pod: pod_name.to_string(),
            container: container.to_string(),
        };

        if let Some(record) = self.pods.find_scripted_by_name(namespace, pod_name)? {
            let status = record
                .containers
                .get(container)
                .ok_or_else(container_not_found)?;
            return Ok(tail(&status.message, opts.tail_lines));
        }

        let record = self.lookup(namespace, pod_name).await?;
        let status = record
            .containers
            .get(container)
            .ok_or_else(container_not_found)?;
        let path = self
            .config
            .pod_log_root
            .join(record.uid())
            .join(crate::translate::container_log_file(
                container,
                status.metadata.attempt,
            ));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| Error::LocalIo { path, source })?;
        Ok(tail(&content, opts.tail_lines))
    }

    // =========================================================================
    // Node
    // =========================================================================

    /// Fills in the node object from static configuration.
    pub fn configure_node(&self, node: &mut Node) {
        node::configure_node(&self.config, node);
    }

    // =========================================================================
    // Notification
    // =========================================================================

    /// Registers the status callback and starts the timer and event loops.
    ///
    /// Calling again replaces the callback without starting more loops.
    ///
    /// # Errors
    ///
    /// - Not called from within a Tokio runtime
    pub fn notify_pods<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(Pod) + Send + Sync + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Internal(format!("status loops need a Tokio runtime: {e}")))?;

        self.notifier.set_callback(Arc::new(callback));
        let Some(signals) = self.notifier.take_receiver() else {
            tracing::debug!("status loops already running, callback replaced");
            return Ok(());
        };

        let timer = handle.spawn(notify::run_timer_loop(
            self.client.clone(),
            Arc::clone(&self.pods),
            Arc::clone(&self.notifier),
            self.config.node_name.clone(),
            self.config.status_sync_interval(),
            self.cancel.child_token(),
        ));
        let events = handle.spawn(notify::run_event_loop(
            signals,
            Arc::clone(&self.pods),
            Arc::clone(&self.notifier),
            self.config.node_name.clone(),
            self.cancel.child_token(),
        ));

        self.loops
            .lock()
            .map_err(|_| Error::Internal("loop handle lock poisoned".to_string()))?
            .extend([timer, events]);
        Ok(())
    }

    /// Stops both loops, kills outstanding script processes and aborts
    /// in-flight runtime calls.
    pub async fn shutdown(&self) {
        tracing::info!(node = %self.config.node_name, "shutting down CRI provider");
        self.cancel.cancel();

        let handles = match self.loops.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "status loop did not exit cleanly");
            }
        }
    }
}

impl std::fmt::Debug for CriProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriProvider")
            .field("node", &self.config.node_name)
            .field("client", &self.client)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

/// Last `n` lines of `content`, or all of it.
fn tail(content: &str, n: Option<usize>) -> String {
    match n {
        None => content.to_string(),
        Some(n) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(n);
            let mut out = lines[start..].join("\n");
            if !out.is_empty() && content.ends_with('\n') {
                out.push('\n');
            }
            out
        }
    }
}

/// Creates a directory (and parents) with the given mode.
fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::LocalIo {
        path: path.to_path_buf(),
        source,
    })?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|source| {
        Error::LocalIo {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
