//! Virtual node description.
//!
//! Fills in what the orchestrator needs to schedule onto this node: capacity,
//! health conditions, addresses, the daemon endpoint and system info. All of
//! it is static configuration plus host detection; none of it comes from the
//! runtime.

use crate::config::ProviderConfig;
use crate::constants::{DEFAULT_MAX_PODS, DEFAULT_NODE_MEMORY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Node Model
// =============================================================================

/// Node object as registered with the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStatus {
    /// Resource name (`cpu`, `memory`, `pods`) → quantity.
    pub capacity: BTreeMap<String, String>,
    pub allocatable: BTreeMap<String, String>,
    pub conditions: Vec<NodeCondition>,
    pub addresses: Vec<NodeAddress>,
    pub daemon_endpoints: NodeDaemonEndpoints,
    pub node_info: NodeSystemInfo,
}

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub last_heartbeat_time: Option<DateTime<Utc>>,
    pub last_transition_time: Option<DateTime<Utc>>,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeDaemonEndpoints {
    pub kubelet_endpoint: DaemonEndpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DaemonEndpoint {
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeSystemInfo {
    pub operating_system: String,
    pub architecture: String,
    pub kernel_version: String,
}

// =============================================================================
// Host Detection
// =============================================================================

/// Facts about the machine the agent runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Orchestrator architecture name (`amd64`, `arm64`, ...).
    pub architecture: &'static str,
    pub kernel_version: Option<String>,
    pub cpus: usize,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            architecture: Self::detect_arch(),
            kernel_version: Self::detect_kernel_version(),
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    fn detect_arch() -> &'static str {
        #[cfg(target_arch = "x86_64")]
        return "amd64";

        #[cfg(target_arch = "aarch64")]
        return "arm64";

        #[cfg(target_arch = "arm")]
        return "arm";

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "arm")))]
        return "unknown";
    }

    fn detect_kernel_version() -> Option<String> {
        #[cfg(unix)]
        {
            use std::process::Command;
            Command::new("uname")
                .arg("-r")
                .output()
                .ok()
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }

        #[cfg(not(unix))]
        {
            None
        }
    }
}

// =============================================================================
// Node Configuration
// =============================================================================

/// Capacity map; empty inputs fall back to host CPUs, 500 GiB and 200 pods.
pub fn node_capacity(
    cpu: &str,
    memory: &str,
    max_pods: &str,
    host: &HostInfo,
) -> BTreeMap<String, String> {
    let or_default = |value: &str, default: String| {
        if value.is_empty() {
            default
        } else {
            value.to_string()
        }
    };
    BTreeMap::from([
        ("cpu".to_string(), or_default(cpu, host.cpus.to_string())),
        (
            "memory".to_string(),
            or_default(memory, format!("{}Gi", DEFAULT_NODE_MEMORY >> 30)),
        ),
        (
            "pods".to_string(),
            or_default(max_pods, DEFAULT_MAX_PODS.to_string()),
        ),
    ])
}

/// The standard node conditions, all healthy, stamped with `now`.
pub fn node_conditions(now: DateTime<Utc>) -> Vec<NodeCondition> {
    let condition = |kind: &str, status, reason: &str, message: &str| NodeCondition {
        condition_type: kind.to_string(),
        status,
        last_heartbeat_time: Some(now),
        last_transition_time: Some(now),
        reason: reason.to_string(),
        message: message.to_string(),
    };
    vec![
        condition(
            "Ready",
            ConditionStatus::True,
            "KubeletReady",
            "virtual-kubelet is ready.",
        ),
        condition(
            "OutOfDisk",
            ConditionStatus::False,
            "KubeletHasSufficientDisk",
            "virtual-kubelet has sufficient disk space available",
        ),
        condition(
            "MemoryPressure",
            ConditionStatus::False,
            "KubeletHasSufficientMemory",
            "virtual-kubelet has sufficient memory available",
        ),
        condition(
            "DiskPressure",
            ConditionStatus::False,
            "KubeletHasNoDiskPressure",
            "virtual-kubelet has no disk pressure",
        ),
        condition(
            "NetworkUnavailable",
            ConditionStatus::False,
            "RouteCreated",
            "RouteController created a route",
        ),
    ]
}

/// Populates a node object from static configuration.
pub fn configure_node(config: &ProviderConfig, node: &mut Node) {
    let host = HostInfo::detect();
    let capacity = node_capacity(
        &config.resource_cpu,
        &config.resource_memory,
        &config.max_pods,
        &host,
    );

    if node.name.is_empty() {
        node.name = config.node_name.clone();
    }
    node.status.allocatable = capacity.clone();
    node.status.capacity = capacity;
    node.status.conditions = node_conditions(Utc::now());
    node.status.addresses = vec![NodeAddress {
        address_type: "InternalIP".to_string(),
        address: config.internal_ip.clone(),
    }];
    node.status.daemon_endpoints = NodeDaemonEndpoints {
        kubelet_endpoint: DaemonEndpoint {
            port: config.daemon_endpoint_port,
        },
    };
    node.status.node_info.operating_system = config.operating_system.clone();
    node.status.node_info.architecture = host.architecture.to_string();
    node.status.node_info.kernel_version = host.kernel_version.unwrap_or_default();
}
