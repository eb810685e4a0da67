//! # vkcri
//!
//! **Virtual Node Provider over the Container Runtime Interface**
//!
//! This crate lets a cluster orchestrator treat a machine as a node without a
//! full kubelet. Pods submitted to the node are realized by calling a
//! container runtime's sandbox, container and image RPCs directly, and the
//! runtime's view is projected back into pod status.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     orchestrator framework                          │
//! │  CreatePod │ DeletePod │ GetPod(s) │ GetPodStatus │ NotifyPods      │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │                          CriProvider                                │
//! │   PodKind::of(pod) ──┬── Managed  → translate → RuntimeClient       │
//! │                      └── Scripted → local OS processes              │
//! │                                                                     │
//! │   PodManager  [managed partition: swapped per refresh]              │
//! │               [scripted partition: mutated by script tasks]         │
//! │                                                                     │
//! │   project::*  cached runtime state → Pod / PodStatus                │
//! │   timer loop (refresh + push)   event loop (script signals + push)  │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │              RuntimeService + ImageService (transport)              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Semantics
//!
//! | Operation | On failure                                                  |
//! |-----------|-------------------------------------------------------------|
//! | create    | stop at the first failing step; started containers stay     |
//! | delete    | stop and volume cleanup are best-effort; removal must pass  |
//! | refresh   | cache left untouched (all-or-nothing)                       |
//! | read      | error surfaced to the caller                                |
//!
//! Nothing here retries; retry policy belongs to the orchestrator.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vkcri::{CriProvider, ProviderConfig, RuntimeClient};
//!
//! #[tokio::main]
//! async fn main() -> vkcri::Result<()> {
//!     let config = ProviderConfig::load("/etc/vk-cri/config.yaml")?;
//!     let client = RuntimeClient::new(runtime_transport(), image_transport());
//!     let provider = CriProvider::new(config, client)?;
//!
//!     provider.notify_pods(|pod| println!("{} → {:?}", pod.key(), pod.status.phase))?;
//!     provider.create_pod(&vkcri::Pod::from_yaml(MANIFEST)?).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod cri;
pub mod error;
pub mod manager;
pub mod node;
pub mod pod;
pub mod project;
pub mod provider;
pub mod translate;

// Re-exports
pub use config::ProviderConfig;
pub use constants::*;
pub use cri::{ImageService, RuntimeClient, RuntimeService};
pub use error::{Error, Result};
pub use manager::{PodManager, SandboxRecord};
pub use node::{configure_node, Node};
pub use pod::{ContainerSpec, Pod, PodKind, PodPhase, PodStatus};
pub use provider::{CriProvider, LogOptions, PodCallback};
