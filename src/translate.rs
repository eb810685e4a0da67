//! Pod to runtime request translation.
//!
//! Pure functions: they read the pod and produce new request values, never
//! touching the input. The only derived data is path naming:
//!
//! ```text
//! sandbox log directory   {logRoot}/{uid}
//! container log path      {containerName}-{attempt}.log   (relative to the above)
//! volume directory        {volRoot}/{uid}
//! ```

use crate::cri::{
    ContainerConfig, ContainerMetadata, ImageSpec, KeyValue, PodSandboxConfig, PodSandboxMetadata,
    PortMapping, Protocol,
};
use crate::error::{Error, Result};
use crate::pod::{ContainerSpec, Pod};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Label carrying the pod name on every container.
pub const LABEL_POD_NAME: &str = "io.kubernetes.pod.name";
/// Label carrying the pod namespace on every container.
pub const LABEL_POD_NAMESPACE: &str = "io.kubernetes.pod.namespace";
/// Label carrying the pod UID on every container.
pub const LABEL_POD_UID: &str = "io.kubernetes.pod.uid";
/// Label carrying the container name on every container.
pub const LABEL_CONTAINER_NAME: &str = "io.kubernetes.container.name";

/// Per-pod log directory.
pub fn pod_log_dir(log_root: &Path, pod: &Pod) -> PathBuf {
    log_root.join(pod.uid())
}

/// Per-pod volume directory.
pub fn pod_volume_dir(vol_root: &Path, pod: &Pod) -> PathBuf {
    vol_root.join(pod.uid())
}

/// Container log file name, relative to the sandbox log directory.
pub fn container_log_file(container_name: &str, attempt: u32) -> String {
    format!("{container_name}-{attempt}.log")
}

/// Builds the `RunPodSandbox` request for a pod.
///
/// # Errors
///
/// - Pod has no name, namespace or UID
pub fn build_sandbox_config(
    pod: &Pod,
    log_directory: &Path,
    attempt: u32,
) -> Result<PodSandboxConfig> {
    let meta = &pod.metadata;
    if meta.name.is_empty() || meta.namespace.is_empty() || meta.uid.is_empty() {
        return Err(Error::InvalidInput(format!(
            "pod {} must have a name, namespace and UID",
            pod.key()
        )));
    }

    Ok(PodSandboxConfig {
        metadata: PodSandboxMetadata {
            name: meta.name.clone(),
            namespace: meta.namespace.clone(),
            uid: meta.uid.clone(),
            attempt,
        },
        hostname: meta.name.clone(),
        log_directory: log_directory.to_string_lossy().into_owned(),
        port_mappings: port_mappings(pod),
        labels: meta.labels.clone(),
        annotations: meta.annotations.clone(),
    })
}

/// Builds the `CreateContainer` request for one declared container.
///
/// `image_ref` is the reference resolved by the image pull and replaces the
/// declared image. Volume mounts are not translated; `_volume_root` is
/// accepted so the signature matches the sandbox layout.
///
/// # Errors
///
/// - Container has no name
/// - `image_ref` is empty
pub fn build_container_config(
    container: &ContainerSpec,
    pod: &Pod,
    image_ref: &str,
    _volume_root: &Path,
    attempt: u32,
) -> Result<ContainerConfig> {
    if container.name.is_empty() {
        return Err(Error::InvalidInput(format!(
            "container in pod {} has no name",
            pod.key()
        )));
    }
    if image_ref.is_empty() {
        return Err(Error::InvalidInput(format!(
            "container '{}' has no resolved image",
            container.name
        )));
    }

    Ok(ContainerConfig {
        metadata: ContainerMetadata {
            name: container.name.clone(),
            attempt,
        },
        image: ImageSpec::new(image_ref),
        command: container.command.clone(),
        args: container.args.clone(),
        working_dir: container.working_dir.clone(),
        envs: container
            .env
            .iter()
            .map(|e| KeyValue {
                key: e.name.clone(),
                value: e.value.clone(),
            })
            .collect(),
        labels: container_labels(container, pod),
        annotations: HashMap::new(),
        log_path: container_log_file(&container.name, attempt),
        stdin: container.stdin,
        stdin_once: container.stdin_once,
        tty: container.tty,
    })
}

/// One mapping per declared container port, across all containers.
fn port_mappings(pod: &Pod) -> Vec<PortMapping> {
    pod.spec
        .containers
        .iter()
        .flat_map(|c| c.ports.iter())
        .map(|p| PortMapping {
            protocol: Protocol::parse(&p.protocol),
            container_port: i32::from(p.container_port),
            host_port: p.host_port.map(i32::from).unwrap_or_default(),
            host_ip: p.host_ip.clone().unwrap_or_default(),
        })
        .collect()
}

fn container_labels(container: &ContainerSpec, pod: &Pod) -> HashMap<String, String> {
    HashMap::from([
        (LABEL_POD_NAME.to_string(), pod.metadata.name.clone()),
        (LABEL_POD_NAMESPACE.to_string(), pod.metadata.namespace.clone()),
        (LABEL_POD_UID.to_string(), pod.metadata.uid.clone()),
        (LABEL_CONTAINER_NAME.to_string(), container.name.clone()),
    ])
}
