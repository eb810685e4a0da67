//! Orchestrator-facing pod model.
//!
//! A [`Pod`] is both the unit of desired state the orchestrator submits and
//! the object the provider pushes back with observed status:
//!
//! ```text
//! orchestrator ── Pod{metadata, spec} ──▶ CriProvider
//! orchestrator ◀── Pod{metadata, spec, status} ── projector / notifier
//! ```
//!
//! [`PodKind`] selects the backing mechanism from the `type` annotation:
//! runtime sandboxes (`Managed`) or local OS processes (`Scripted`).

mod spec;
mod status;

pub use spec::{ContainerPort, ContainerSpec, EnvVar, ObjectMeta, Pod, PodKind, PodSpec};
pub use status::{ContainerState, ContainerStatus, PodCondition, PodPhase, PodStatus};
