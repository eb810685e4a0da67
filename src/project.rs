//! Runtime state to orchestrator status projection.
//!
//! | Cached state       | Projected state | Fields carried                          |
//! |--------------------|-----------------|-----------------------------------------|
//! | unknown / created  | waiting         | reason, message                         |
//! | running            | running         | start time                              |
//! | exited             | terminated      | exit code, reason, message, start, end  |
//!
//! Pod phase is `Running` when the sandbox is ready and `Pending` otherwise.
//! Succeeded/Failed are never derived from container exits.

use crate::cri::{self, ContainerState as CriState};
use crate::manager::SandboxRecord;
use crate::pod::{
    ContainerSpec, ContainerState, ContainerStatus, ObjectMeta, Pod, PodPhase, PodSpec, PodStatus,
};
use chrono::{DateTime, Utc};

/// Converts runtime nanoseconds to a timestamp.
pub fn from_unix_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

/// Current time in runtime nanoseconds.
pub fn now_unix_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// Maps a cached runtime container status to its orchestrator state.
pub fn container_state(status: &cri::ContainerStatus) -> ContainerState {
    match status.state {
        CriState::Unknown | CriState::Created => ContainerState::Waiting {
            reason: status.reason.clone(),
            message: status.message.clone(),
        },
        CriState::Running => ContainerState::Running {
            started_at: from_unix_nanos(status.started_at),
        },
        CriState::Exited => ContainerState::Terminated {
            exit_code: status.exit_code,
            reason: status.reason.clone(),
            message: status.message.clone(),
            started_at: from_unix_nanos(status.started_at),
            finished_at: from_unix_nanos(status.finished_at),
        },
    }
}

fn image_of(status: &cri::ContainerStatus) -> String {
    status
        .image
        .as_ref()
        .map(|i| i.image.clone())
        .unwrap_or_default()
}

fn image_ref_of(status: &cri::ContainerStatus) -> String {
    if status.image.is_none() {
        return String::new();
    }
    status.image_ref.clone()
}

/// Maps one cached container to its orchestrator status.
pub fn container_status(status: &cri::ContainerStatus) -> ContainerStatus {
    ContainerStatus {
        name: status.metadata.name.clone(),
        image: image_of(status),
        image_id: image_ref_of(status),
        container_id: status.id.clone(),
        ready: status.state == CriState::Running,
        restart_count: 0,
        state: container_state(status),
    }
}

/// Containers of a record, ordered by name.
fn sorted_containers(record: &SandboxRecord) -> Vec<&cri::ContainerStatus> {
    let mut containers: Vec<_> = record.containers.values().collect();
    containers.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
    containers
}

/// Renders the orchestrator status of a cached pod.
pub fn pod_status(record: &SandboxRecord) -> PodStatus {
    let phase = if record.is_ready() {
        PodPhase::Running
    } else {
        PodPhase::Pending
    };

    PodStatus {
        phase,
        conditions: Vec::new(),
        message: String::new(),
        reason: String::new(),
        host_ip: String::new(),
        pod_ip: record
            .status
            .network
            .as_ref()
            .map(|n| n.ip.clone())
            .unwrap_or_default(),
        start_time: Some(from_unix_nanos(record.status.created_at)),
        container_statuses: sorted_containers(record)
            .into_iter()
            .map(container_status)
            .collect(),
    }
}

/// Renders a full pod object from a cached record.
pub fn pod_from_record(record: &SandboxRecord, node_name: &str) -> Pod {
    let meta = &record.status.metadata;
    Pod {
        metadata: ObjectMeta {
            name: meta.name.clone(),
            namespace: meta.namespace.clone(),
            uid: meta.uid.clone(),
            labels: record.status.labels.clone(),
            annotations: record.status.annotations.clone(),
            creation_timestamp: Some(from_unix_nanos(record.status.created_at)),
        },
        spec: PodSpec {
            node_name: node_name.to_string(),
            containers: sorted_containers(record)
                .into_iter()
                .map(|c| ContainerSpec {
                    name: c.metadata.name.clone(),
                    image: image_of(c),
                    ..Default::default()
                })
                .collect(),
            volumes: Vec::new(),
        },
        status: pod_status(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_round_trip() {
        let ts = from_unix_nanos(1_700_000_000_123_456_789);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_789);
    }
}
