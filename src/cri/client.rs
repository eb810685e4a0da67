//! Runtime client facade.
//!
//! [`RuntimeService`] and [`ImageService`] are the outbound RPC surface the
//! provider depends on; a transport adapter (gRPC over the runtime socket in
//! production, an in-memory fake in tests) implements them. [`RuntimeClient`]
//! bundles one of each for a single runtime endpoint and applies the
//! per-call policy:
//!
//! - every call is bounded by the configured deadline
//! - every call aborts when the engine-wide cancellation token fires
//! - calls addressed by identifier reject an empty one before any RPC

use super::types::{
    Container, ContainerConfig, ContainerFilter, ContainerStatus, ImageSpec, PodSandbox,
    PodSandboxConfig, PodSandboxFilter, PodSandboxStatus,
};
use crate::constants::DEFAULT_RPC_TIMEOUT;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sandbox and container lifecycle RPCs.
#[async_trait]
pub trait RuntimeService: Send + Sync {
    /// Creates and starts a sandbox, returning its runtime-assigned ID.
    async fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> Result<String>;

    /// Stops every process in the sandbox and tears down its network.
    async fn stop_pod_sandbox(&self, pod_sandbox_id: &str) -> Result<()>;

    /// Removes the sandbox and every container bound to it.
    async fn remove_pod_sandbox(&self, pod_sandbox_id: &str) -> Result<()>;

    /// Lists sandboxes matching the filter.
    async fn list_pod_sandbox(&self, filter: &PodSandboxFilter) -> Result<Vec<PodSandbox>>;

    /// Returns the status of one sandbox.
    async fn pod_sandbox_status(&self, pod_sandbox_id: &str) -> Result<PodSandboxStatus>;

    /// Creates a container inside a sandbox, returning its ID.
    async fn create_container(
        &self,
        pod_sandbox_id: &str,
        config: &ContainerConfig,
        sandbox_config: &PodSandboxConfig,
    ) -> Result<String>;

    /// Starts a created container.
    async fn start_container(&self, container_id: &str) -> Result<()>;

    /// Lists containers matching the filter.
    async fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<Container>>;

    /// Returns the status of one container.
    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus>;
}

/// Image RPCs.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Pulls an image, returning the resolved image reference.
    async fn pull_image(&self, image: &ImageSpec) -> Result<String>;
}

/// Capability to talk to one runtime endpoint.
#[derive(Clone)]
pub struct RuntimeClient {
    runtime: Arc<dyn RuntimeService>,
    images: Arc<dyn ImageService>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl RuntimeClient {
    /// Creates a client with the default per-call deadline.
    pub fn new(runtime: Arc<dyn RuntimeService>, images: Arc<dyn ImageService>) -> Self {
        Self {
            runtime,
            images,
            timeout: DEFAULT_RPC_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the per-call deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ties every call to the given cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs one RPC under the deadline and the cancellation token.
    async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled(operation.to_string())),
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(Error::Timeout {
                    operation: operation.to_string(),
                    duration: self.timeout,
                }),
            },
        }
    }

    // =========================================================================
    // Sandbox Operations
    // =========================================================================

    pub async fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> Result<String> {
        let id = self
            .call("RunPodSandbox", self.runtime.run_pod_sandbox(config))
            .await?;
        tracing::debug!(sandbox = %id, pod = %config.metadata.uid, "RunPodSandbox");
        Ok(id)
    }

    pub async fn stop_pod_sandbox(&self, id: &str) -> Result<()> {
        require_id(id, "StopPodSandbox")?;
        self.call("StopPodSandbox", self.runtime.stop_pod_sandbox(id))
            .await
    }

    pub async fn remove_pod_sandbox(&self, id: &str) -> Result<()> {
        require_id(id, "RemovePodSandbox")?;
        self.call("RemovePodSandbox", self.runtime.remove_pod_sandbox(id))
            .await
    }

    /// Lists every sandbox known to the runtime.
    pub async fn list_pod_sandboxes(&self) -> Result<Vec<PodSandbox>> {
        let filter = PodSandboxFilter::default();
        self.call("ListPodSandbox", self.runtime.list_pod_sandbox(&filter))
            .await
    }

    pub async fn pod_sandbox_status(&self, id: &str) -> Result<PodSandboxStatus> {
        require_id(id, "PodSandboxStatus")?;
        self.call("PodSandboxStatus", self.runtime.pod_sandbox_status(id))
            .await
    }

    // =========================================================================
    // Container Operations
    // =========================================================================

    pub async fn create_container(
        &self,
        pod_sandbox_id: &str,
        config: &ContainerConfig,
        sandbox_config: &PodSandboxConfig,
    ) -> Result<String> {
        require_id(pod_sandbox_id, "CreateContainer")?;
        let id = self
            .call(
                "CreateContainer",
                self.runtime
                    .create_container(pod_sandbox_id, config, sandbox_config),
            )
            .await?;
        tracing::debug!(
            sandbox = %pod_sandbox_id,
            container = %config.metadata.name,
            id = %id,
            "CreateContainer"
        );
        Ok(id)
    }

    pub async fn start_container(&self, id: &str) -> Result<()> {
        require_id(id, "StartContainer")?;
        self.call("StartContainer", self.runtime.start_container(id))
            .await
    }

    /// Lists the containers bound to one sandbox.
    pub async fn containers_for_sandbox(&self, pod_sandbox_id: &str) -> Result<Vec<Container>> {
        let filter = ContainerFilter::for_sandbox(pod_sandbox_id);
        self.call("ListContainers", self.runtime.list_containers(&filter))
            .await
    }

    pub async fn container_status(&self, id: &str) -> Result<ContainerStatus> {
        require_id(id, "ContainerStatus")?;
        self.call("ContainerStatus", self.runtime.container_status(id))
            .await
    }

    // =========================================================================
    // Image Operations
    // =========================================================================

    /// Pulls an image and returns the runtime's resolved reference.
    pub async fn pull_image(&self, image: &str) -> Result<String> {
        if image.is_empty() {
            return Err(Error::InvalidInput(
                "image reference cannot be empty".to_string(),
            ));
        }
        let spec = ImageSpec::new(image);
        let image_ref = self.call("PullImage", self.images.pull_image(&spec)).await?;
        tracing::debug!(image = %image, image_ref = %image_ref, "PullImage");
        Ok(image_ref)
    }
}

impl std::fmt::Debug for RuntimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn require_id(id: &str, operation: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{operation}: ID cannot be empty"
        )));
    }
    Ok(())
}
