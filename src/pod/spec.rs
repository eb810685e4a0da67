//! Workload specification types.
//!
//! The orchestrator submits a [`Pod`] (metadata + spec) and receives the same
//! type back with its status filled in. Manifests can also be parsed from
//! YAML for tests and local tooling.

use super::status::PodStatus;
use crate::constants::{
    MAX_CONTAINERS_PER_POD, MAX_CONTAINER_NAME_LEN, MAX_ENV_VARS_PER_CONTAINER, MAX_MANIFEST_SIZE,
    MAX_NAMESPACE_LEN, MAX_NAME_LEN, POD_TYPE_ANNOTATION, SCRIPT_POD_TYPE,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Validation Helpers
// =============================================================================

/// Validates a Kubernetes-compatible name (RFC 1123 DNS label).
fn validate_name(name: &str, max_len: usize) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("name cannot be empty".to_string()));
    }

    if name.len() > max_len {
        return Err(Error::InvalidInput(format!(
            "name '{}' exceeds maximum length of {}",
            name, max_len
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(Error::InvalidInput(format!(
            "name '{}' must contain only lowercase alphanumeric characters, '-' or '.'",
            name
        )));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(Error::InvalidInput(format!(
            "name '{}' cannot start or end with '-'",
            name
        )));
    }

    Ok(())
}

// =============================================================================
// Pod
// =============================================================================

/// Object metadata shared by every orchestrator object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Unique identity assigned by the orchestrator.
    pub uid: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// A pod: desired state plus last observed status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    pub status: PodStatus,
}

/// Desired state of a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodSpec {
    /// Node the pod is bound to.
    pub node_name: String,
    pub containers: Vec<ContainerSpec>,
    /// Declared volume names. Only empty-dir style local paths are backed.
    pub volumes: Vec<String>,
}

/// How a pod is executed on this node.
///
/// Resolved once when a call enters the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodKind {
    /// Backed by a runtime sandbox.
    Managed,
    /// Run as local OS processes.
    Scripted,
}

impl PodKind {
    /// Reads the dispatch annotation.
    pub fn of(pod: &Pod) -> Self {
        match pod.metadata.annotations.get(POD_TYPE_ANNOTATION) {
            Some(kind) if kind == SCRIPT_POD_TYPE => Self::Scripted,
            _ => Self::Managed,
        }
    }
}

impl std::fmt::Display for PodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed => write!(f, "managed"),
            Self::Scripted => write!(f, "scripted"),
        }
    }
}

impl Pod {
    /// `namespace/name`, for log fields and messages.
    pub fn key(&self) -> String {
        format!("{}/{}", self.metadata.namespace, self.metadata.name)
    }

    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    /// Parses a pod manifest from YAML bytes.
    ///
    /// A missing namespace defaults to `default`; a missing UID is generated.
    ///
    /// # Errors
    ///
    /// - Size exceeds `MAX_MANIFEST_SIZE`
    /// - YAML parsing fails
    /// - Validation errors for names and counts
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        if yaml.len() > MAX_MANIFEST_SIZE {
            return Err(Error::InvalidInput(format!(
                "manifest size {} exceeds limit of {}",
                yaml.len(),
                MAX_MANIFEST_SIZE
            )));
        }

        let doc: serde_yaml::Value =
            serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidInput(e.to_string()))?;

        Self::from_value(&doc)
    }

    /// Parses a pod from a `serde_yaml::Value`.
    pub fn from_value(doc: &serde_yaml::Value) -> Result<Self> {
        let metadata = doc.get("metadata");

        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(|n| n.as_str())
            .unwrap_or("default")
            .to_string();
        validate_name(&namespace, MAX_NAMESPACE_LEN)?;

        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(|n| n.as_str())
            .ok_or_else(|| Error::InvalidInput("missing metadata.name".to_string()))?
            .to_string();
        validate_name(&name, MAX_NAME_LEN)?;

        let uid = metadata
            .and_then(|m| m.get("uid"))
            .and_then(|u| u.as_str())
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let labels = parse_string_map(metadata.and_then(|m| m.get("labels")), "label")?;
        let annotations =
            parse_string_map(metadata.and_then(|m| m.get("annotations")), "annotation")?;

        let spec = doc.get("spec");

        let node_name = spec
            .and_then(|s| s.get("nodeName"))
            .and_then(|n| n.as_str())
            .unwrap_or_default()
            .to_string();

        let containers_seq = spec
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.as_sequence())
            .ok_or_else(|| Error::InvalidInput("missing spec.containers".to_string()))?;

        if containers_seq.len() > MAX_CONTAINERS_PER_POD {
            return Err(Error::InvalidInput(format!(
                "too many containers: {} (max {})",
                containers_seq.len(),
                MAX_CONTAINERS_PER_POD
            )));
        }

        let containers: Vec<ContainerSpec> = containers_seq
            .iter()
            .map(ContainerSpec::from_value)
            .collect::<Result<Vec<_>>>()?;

        if containers.is_empty() {
            return Err(Error::InvalidInput(
                "at least one container required".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for c in &containers {
            if !seen.insert(c.name.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate container name '{}'",
                    c.name
                )));
            }
        }

        let volumes = spec
            .and_then(|s| s.get("volumes"))
            .and_then(|v| v.as_sequence())
            .map(|seq| {
                seq.iter()
                    .filter_map(|v| v.get("name")?.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            metadata: ObjectMeta {
                name,
                namespace,
                uid,
                labels,
                annotations,
                creation_timestamp: None,
            },
            spec: PodSpec {
                node_name,
                containers,
                volumes,
            },
            status: PodStatus::default(),
        })
    }
}

fn parse_string_map(value: Option<&serde_yaml::Value>, kind: &str) -> Result<HashMap<String, String>> {
    let Some(mapping) = value.and_then(|v| v.as_mapping()) else {
        return Ok(HashMap::new());
    };

    let mut result = HashMap::new();
    for (k, v) in mapping.iter() {
        let key = k
            .as_str()
            .ok_or_else(|| Error::InvalidInput(format!("{} key must be a string", kind)))?;
        let val = v
            .as_str()
            .ok_or_else(|| Error::InvalidInput(format!("{} value must be a string", kind)))?;
        result.insert(key.to_string(), val.to_string());
    }
    Ok(result)
}

// =============================================================================
// Container Specification
// =============================================================================

/// A port declared by a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: Option<String>,
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub host_ip: Option<String>,
    /// `TCP`, `UDP` or `SCTP`.
    pub protocol: String,
}

/// An environment variable with a literal value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// A single container declaration within a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Container name (unique within pod, RFC 1123 label).
    pub name: String,
    /// Image reference (e.g., "nginx:1.25", "ghcr.io/user/app:v1").
    pub image: String,
    /// Overrides the image entrypoint. For script pods, the program and its
    /// leading arguments.
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub working_dir: String,
    pub ports: Vec<ContainerPort>,
    /// Environment variables, in declaration order.
    pub env: Vec<EnvVar>,
    pub stdin: bool,
    pub stdin_once: bool,
    pub tty: bool,
}

impl ContainerSpec {
    /// Parses from a YAML value.
    pub fn from_value(value: &serde_yaml::Value) -> Result<Self> {
        let name = value
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| Error::InvalidInput("missing container name".to_string()))?
            .to_string();
        validate_name(&name, MAX_CONTAINER_NAME_LEN)?;

        let image = value
            .get("image")
            .and_then(|i| i.as_str())
            .unwrap_or_default()
            .to_string();

        let command = string_seq(value.get("command"));
        let args = string_seq(value.get("args"));

        let working_dir = value
            .get("workingDir")
            .and_then(|w| w.as_str())
            .unwrap_or_default()
            .to_string();

        let env = parse_env_vars(value.get("env"), &name)?;
        let ports = parse_ports(value.get("ports"));

        let flag = |key: &str| value.get(key).and_then(|b| b.as_bool()).unwrap_or(false);

        Ok(Self {
            name,
            image,
            command,
            args,
            working_dir,
            ports,
            env,
            stdin: flag("stdin"),
            stdin_once: flag("stdinOnce"),
            tty: flag("tty"),
        })
    }
}

fn string_seq(value: Option<&serde_yaml::Value>) -> Vec<String> {
    value
        .and_then(|c| c.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_env_vars(
    value: Option<&serde_yaml::Value>,
    container_name: &str,
) -> Result<Vec<EnvVar>> {
    let Some(seq) = value.and_then(|v| v.as_sequence()) else {
        return Ok(Vec::new());
    };

    if seq.len() > MAX_ENV_VARS_PER_CONTAINER {
        return Err(Error::InvalidInput(format!(
            "too many environment variables in container {}: {} (max {})",
            container_name,
            seq.len(),
            MAX_ENV_VARS_PER_CONTAINER
        )));
    }

    seq.iter()
        .map(|item| {
            let env_name = item
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| Error::InvalidInput("missing env name".to_string()))?;
            let val = item.get("value").and_then(|v| v.as_str()).unwrap_or("");
            Ok(EnvVar {
                name: env_name.to_string(),
                value: val.to_string(),
            })
        })
        .collect()
}

fn parse_ports(value: Option<&serde_yaml::Value>) -> Vec<ContainerPort> {
    let Some(seq) = value.and_then(|v| v.as_sequence()) else {
        return Vec::new();
    };

    seq.iter()
        .filter_map(|p| {
            let container_port = u16::try_from(p.get("containerPort")?.as_u64()?).ok()?;
            let protocol = p
                .get("protocol")
                .and_then(|pr| pr.as_str())
                .unwrap_or("TCP")
                .to_string();
            let name = p.get("name").and_then(|n| n.as_str()).map(String::from);
            let host_port = p
                .get("hostPort")
                .and_then(|hp| hp.as_u64())
                .and_then(|hp| u16::try_from(hp).ok());
            let host_ip = p.get("hostIP").and_then(|h| h.as_str()).map(String::from);
            Some(ContainerPort {
                name,
                container_port,
                host_port,
                host_ip,
                protocol,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_name_rejects_uppercase() {
        assert!(validate_name("Web", MAX_NAME_LEN).is_err());
        assert!(validate_name("web-1", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn pod_kind_defaults_to_managed() {
        let mut pod = Pod::default();
        assert_eq!(PodKind::of(&pod), PodKind::Managed);

        pod.metadata
            .annotations
            .insert(POD_TYPE_ANNOTATION.to_string(), "other".to_string());
        assert_eq!(PodKind::of(&pod), PodKind::Managed);

        pod.metadata
            .annotations
            .insert(POD_TYPE_ANNOTATION.to_string(), SCRIPT_POD_TYPE.to_string());
        assert_eq!(PodKind::of(&pod), PodKind::Scripted);
    }
}
