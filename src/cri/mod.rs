//! Container runtime interface: data model and client facade.
//!
//! ```text
//! CriProvider
//!     │
//!     └── RuntimeClient (deadline + cancellation per call)
//!           ├── RuntimeService  RunPodSandbox / StopPodSandbox / RemovePodSandbox
//!           │                   ListPodSandbox / PodSandboxStatus
//!           │                   CreateContainer / StartContainer
//!           │                   ListContainers / ContainerStatus
//!           └── ImageService    PullImage
//! ```
//!
//! The transport is not part of this crate.

mod client;
mod types;

pub use client::{ImageService, RuntimeClient, RuntimeService};
pub use types::{
    Container, ContainerConfig, ContainerFilter, ContainerMetadata, ContainerState,
    ContainerStatus, ImageSpec, KeyValue, PodSandbox, PodSandboxConfig, PodSandboxFilter,
    PodSandboxMetadata, PodSandboxNetworkStatus, PodSandboxState, PodSandboxStatus, PortMapping,
    Protocol,
};
