//! Runtime-backed pods: sandbox creation, teardown and cache refresh.

use super::{ensure_dir, CriProvider};
use crate::constants::{INITIAL_ATTEMPT, POD_LOG_ROOT_PERMS, POD_VOL_ROOT_PERMS};
use crate::cri::RuntimeClient;
use crate::error::{Error, Result};
use crate::manager::{Partition, PodManager, SandboxRecord};
use crate::pod::Pod;
use crate::project;
use crate::translate::{
    build_container_config, build_sandbox_config, pod_log_dir, pod_volume_dir,
};
use std::collections::HashSet;
use std::path::Path;

/// Lists every sandbox and its containers and swaps in the result.
///
/// Nothing is published unless every RPC succeeds.
pub(crate) async fn refresh(client: &RuntimeClient, pods: &PodManager) -> Result<()> {
    let sandboxes = client.list_pod_sandboxes().await?;
    let mut partition = Partition::with_capacity(sandboxes.len());

    for sandbox in sandboxes {
        let status = client.pod_sandbox_status(&sandbox.id).await?;
        let mut record = SandboxRecord::new(sandbox.id.clone(), status);
        for container in client.containers_for_sandbox(&sandbox.id).await? {
            let status = client.container_status(&container.id).await?;
            record
                .containers
                .insert(status.metadata.name.clone(), status);
        }
        partition.insert(record.uid().to_string(), record);
    }

    tracing::debug!(pods = partition.len(), "refreshed runtime pod state");
    pods.replace_managed(partition)
}

/// Best-effort removal of a per-pod directory; a missing directory is fine.
async fn remove_pod_dir(pod: &Pod, dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            pod = %pod.key(),
            path = %dir.display(),
            error = %e,
            "failed to remove pod directory"
        ),
    }
}

impl CriProvider {
    pub(super) async fn create_managed(&self, pod: &Pod) -> Result<()> {
        self.refresh_node_state().await?;

        let log_dir = pod_log_dir(&self.config.pod_log_root, pod);
        let vol_dir = pod_volume_dir(&self.config.pod_vol_root, pod);
        let sandbox_config = build_sandbox_config(pod, &log_dir, INITIAL_ATTEMPT)?;

        // Reuse only a sandbox that belongs to this exact pod identity.
        let existing = self.pods.managed_by_uid(pod.uid())?;
        let (sandbox_id, present) = match existing {
            Some(record) => {
                tracing::info!(pod = %pod.key(), sandbox = %record.id, "reusing existing sandbox");
                let present: HashSet<String> = record.containers.keys().cloned().collect();
                (record.id, present)
            }
            None => {
                if let Some(stale) = self
                    .pods
                    .find_managed_by_name(&pod.metadata.namespace, &pod.metadata.name)?
                {
                    tracing::warn!(
                        pod = %pod.key(),
                        uid = %pod.uid(),
                        stale_uid = %stale.uid(),
                        "sandbox with the same name belongs to another pod, creating a new one"
                    );
                }
                ensure_dir(&log_dir, POD_LOG_ROOT_PERMS)?;
                ensure_dir(&vol_dir, POD_VOL_ROOT_PERMS)?;
                let id = self.client.run_pod_sandbox(&sandbox_config).await?;
                tracing::info!(pod = %pod.key(), sandbox = %id, "sandbox created");
                (id, HashSet::new())
            }
        };

        for container in &pod.spec.containers {
            if present.contains(&container.name) {
                tracing::debug!(pod = %pod.key(), container = %container.name, "container already exists");
                continue;
            }

            let image_ref = self.client.pull_image(&container.image).await?;
            let config =
                build_container_config(container, pod, &image_ref, &vol_dir, INITIAL_ATTEMPT)?;
            let container_id = self
                .client
                .create_container(&sandbox_id, &config, &sandbox_config)
                .await?;
            self.client.start_container(&container_id).await?;
            tracing::info!(
                pod = %pod.key(),
                container = %container.name,
                id = %container_id,
                "container started"
            );
        }

        let pushed = match self.refresh_node_state().await {
            Ok(()) => self
                .pods
                .managed_by_uid(pod.uid())?
                .map(|r| project::pod_from_record(&r, &self.config.node_name)),
            Err(e) => {
                tracing::warn!(pod = %pod.key(), error = %e, "post-create refresh failed");
                None
            }
        };
        self.notifier.push(pushed.unwrap_or_else(|| pod.clone()));
        Ok(())
    }

    pub(super) async fn delete_managed(&self, pod: &Pod) -> Result<()> {
        self.refresh_node_state().await?;

        let uid = pod.uid();
        let record = self
            .pods
            .managed_by_uid(uid)?
            .ok_or_else(|| Error::PodUidNotFound(uid.to_string()))?;

        if let Err(e) = self.client.stop_pod_sandbox(&record.id).await {
            tracing::warn!(pod = %pod.key(), sandbox = %record.id, error = %e, "failed to stop sandbox");
        }

        remove_pod_dir(pod, &pod_volume_dir(&self.config.pod_vol_root, pod)).await;
        remove_pod_dir(pod, &pod_log_dir(&self.config.pod_log_root, pod)).await;

        let removed = self.client.remove_pod_sandbox(&record.id).await;
        match &removed {
            Ok(()) => {
                if let Err(e) = self.pods.remove_managed(uid) {
                    tracing::warn!(pod = %pod.key(), error = %e, "failed to drop cached record");
                }
                tracing::info!(pod = %pod.key(), sandbox = %record.id, "sandbox removed");
            }
            Err(e) => {
                tracing::warn!(pod = %pod.key(), sandbox = %record.id, error = %e, "failed to remove sandbox");
            }
        }

        self.notifier.push(pod.clone());
        removed
    }
}
