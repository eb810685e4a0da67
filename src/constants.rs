//! # Node Agent Constants
//!
//! Defaults, directory layout and dispatch keys shared by the provider,
//! the config translator and the notification loops. Every value here is
//! overridable through [`crate::config::ProviderConfig`] unless stated
//! otherwise.
//!
//! ## Directory Layout
//!
//! ```text
//! /var/log/vk-cri/<pod-uid>/<container>-<attempt>.log   (log root)
//! /run/vk-cri/volumes/<pod-uid>/                        (volume root)
//! ```
//!
//! Both per-pod directories are created before the sandbox is requested.
//! The volume directory is removed on deletion; logs are left for
//! post-mortem inspection.

use std::time::Duration;

// =============================================================================
// Directory Layout
// =============================================================================

/// Default root for per-pod log directories.
pub const DEFAULT_POD_LOG_ROOT: &str = "/var/log/vk-cri";

/// Default root for per-pod empty-dir style volumes.
pub const DEFAULT_POD_VOL_ROOT: &str = "/run/vk-cri/volumes";

/// Permissions for the log root and per-pod log directories.
pub const POD_LOG_ROOT_PERMS: u32 = 0o755;

/// Permissions for the volume root and per-pod volume directories.
pub const POD_VOL_ROOT_PERMS: u32 = 0o755;

// =============================================================================
// Timing
// =============================================================================

/// Period of the runtime-backed status sync loop.
pub const DEFAULT_STATUS_SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// Deadline applied to every individual runtime RPC.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Dispatch
// =============================================================================

/// Annotation key selecting the pod backing mechanism.
pub const POD_TYPE_ANNOTATION: &str = "type";

/// Annotation value routing a pod to the local script path.
pub const SCRIPT_POD_TYPE: &str = "bash";

/// Exit code recorded when a script container fails for any reason.
///
/// Not a real process status; a spawn failure and a non-zero exit both
/// collapse to this value.
pub const SCRIPT_FAILURE_EXIT_CODE: i32 = -9999;

/// Reason recorded for a script container that exited cleanly.
pub const REASON_COMPLETED: &str = "Completed";

/// Reason recorded for a script container that failed.
pub const REASON_ERROR: &str = "Error";

/// Restart attempt passed to the config translator. Always zero.
pub const INITIAL_ATTEMPT: u32 = 0;

// =============================================================================
// Node Defaults
// =============================================================================

/// Default kubelet daemon endpoint port.
pub const DEFAULT_DAEMON_PORT: u16 = 10250;

/// Memory capacity advertised when none is configured (500 GiB).
pub const DEFAULT_NODE_MEMORY: u64 = 500 * 1024 * 1024 * 1024;

/// Pod capacity advertised when none is configured.
pub const DEFAULT_MAX_PODS: &str = "200";

/// Node name used when the configuration carries none.
pub const DEFAULT_NODE_NAME: &str = "vk-cri";

// =============================================================================
// Manifest Limits
// =============================================================================

/// Maximum size of a pod manifest in bytes (1 MiB).
pub const MAX_MANIFEST_SIZE: usize = 1024 * 1024;

/// Maximum number of containers per pod.
pub const MAX_CONTAINERS_PER_POD: usize = 16;

/// Maximum length for pod names (RFC 1123 DNS subdomain).
pub const MAX_NAME_LEN: usize = 253;

/// Maximum length for namespace names.
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Maximum length for container names within a pod.
pub const MAX_CONTAINER_NAME_LEN: usize = 63;

/// Maximum number of environment variables per container.
pub const MAX_ENV_VARS_PER_CONTAINER: usize = 256;
