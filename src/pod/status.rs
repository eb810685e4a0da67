//! Pod status types, as the orchestrator models them.
//!
//! - `PodPhase`: High-level pod lifecycle state
//! - `PodStatus`: Pod status including every container status
//! - `ContainerState`: Waiting / Running / Terminated, with their fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Pod Phase
// =============================================================================

/// High-level pod lifecycle phase.
///
/// Only `Pending` and `Running` are ever produced from runtime state; the
/// terminal phases exist so orchestrator-supplied objects round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Succeeded => write!(f, "Succeeded"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Unknown => write!(f, "Unknown"),
        }
    }
}

// =============================================================================
// Container State
// =============================================================================

/// Lifecycle state of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerState {
    /// Not running yet (created, or state unknown).
    Waiting { reason: String, message: String },
    /// Running since `started_at`.
    Running {
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
    },
    /// Finished.
    Terminated {
        #[serde(rename = "exitCode")]
        exit_code: i32,
        reason: String,
        message: String,
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
        #[serde(rename = "finishedAt")]
        finished_at: DateTime<Utc>,
    },
}

impl Default for ContainerState {
    fn default() -> Self {
        Self::Waiting {
            reason: String::new(),
            message: String::new(),
        }
    }
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }
}

/// Observed status of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerStatus {
    pub name: String,
    pub image: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    #[serde(rename = "containerID")]
    pub container_id: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
}

// =============================================================================
// Pod Status
// =============================================================================

/// A pod condition (`Ready`, `ContainersReady`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

/// Observed status of a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodStatus {
    pub phase: PodPhase,
    pub conditions: Vec<PodCondition>,
    pub message: String,
    pub reason: String,
    #[serde(rename = "hostIP")]
    pub host_ip: String,
    #[serde(rename = "podIP")]
    pub pod_ip: String,
    pub start_time: Option<DateTime<Utc>>,
    pub container_statuses: Vec<ContainerStatus>,
}

impl PodStatus {
    /// Looks up a container status by name.
    pub fn container(&self, name: &str) -> Option<&ContainerStatus> {
        self.container_statuses.iter().find(|c| c.name == name)
    }
}
