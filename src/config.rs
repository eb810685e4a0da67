//! Provider configuration.
//!
//! Static settings describing the virtual node and where the provider keeps
//! its per-pod directories. Loaded from YAML; every field has a default so
//! an empty document is a valid configuration.
//!
//! ```yaml
//! nodeName: edge-01
//! internalIp: 10.0.0.12
//! resourceCpu: "8"
//! statusSyncIntervalSecs: 5
//! ```

use crate::constants::{
    DEFAULT_DAEMON_PORT, DEFAULT_NODE_NAME, DEFAULT_POD_LOG_ROOT, DEFAULT_POD_VOL_ROOT,
    DEFAULT_RPC_TIMEOUT, DEFAULT_STATUS_SYNC_INTERVAL,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Static configuration for one virtual node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Node name registered with the orchestrator.
    pub node_name: String,
    /// Operating system reported in node info.
    pub operating_system: String,
    /// Kubelet daemon endpoint port.
    pub daemon_endpoint_port: u16,
    /// Address advertised as the node's InternalIP.
    pub internal_ip: String,
    /// CPU capacity (empty = host CPU count).
    pub resource_cpu: String,
    /// Memory capacity (empty = built-in default).
    pub resource_memory: String,
    /// Pod capacity (empty = built-in default).
    pub max_pods: String,
    /// Root of the per-pod log directories.
    pub pod_log_root: PathBuf,
    /// Root of the per-pod volume directories.
    pub pod_vol_root: PathBuf,
    /// Period of the runtime-backed status sync loop, in seconds.
    pub status_sync_interval_secs: u64,
    /// Deadline for each runtime RPC, in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            node_name: DEFAULT_NODE_NAME.to_string(),
            operating_system: default_operating_system().to_string(),
            daemon_endpoint_port: DEFAULT_DAEMON_PORT,
            internal_ip: String::new(),
            resource_cpu: String::new(),
            resource_memory: String::new(),
            max_pods: String::new(),
            pod_log_root: default_pod_root(DEFAULT_POD_LOG_ROOT, "log"),
            pod_vol_root: default_pod_root(DEFAULT_POD_VOL_ROOT, "volumes"),
            status_sync_interval_secs: DEFAULT_STATUS_SYNC_INTERVAL.as_secs(),
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT.as_secs(),
        }
    }
}

impl ProviderConfig {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// - YAML parsing fails
    /// - Validation fails (see [`ProviderConfig::validate`])
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        if yaml.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_slice(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&bytes)
    }

    /// Checks the invariants the provider relies on.
    pub fn validate(&self) -> Result<()> {
        if self.node_name.trim().is_empty() {
            return Err(Error::Config("nodeName cannot be empty".to_string()));
        }
        if self.status_sync_interval_secs == 0 {
            return Err(Error::Config(
                "statusSyncIntervalSecs must be greater than zero".to_string(),
            ));
        }
        if self.rpc_timeout_secs == 0 {
            return Err(Error::Config(
                "rpcTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Period of the status sync loop.
    pub fn status_sync_interval(&self) -> Duration {
        Duration::from_secs(self.status_sync_interval_secs)
    }

    /// Per-RPC deadline.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Returns the platform-appropriate root for per-pod directories.
///
/// - Linux: the given system path (`/var/log/vk-cri`, `/run/vk-cri/volumes`)
/// - macOS: `~/.vk-cri/<leaf>` (user-writable)
/// - Windows: `%LOCALAPPDATA%\vk-cri\<leaf>`
fn default_pod_root(system_path: &str, leaf: &str) -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let _ = leaf;
        PathBuf::from(system_path)
    }

    #[cfg(target_os = "macos")]
    {
        let _ = system_path;
        dirs::home_dir()
            .map(|h| h.join(".vk-cri").join(leaf))
            .unwrap_or_else(|| PathBuf::from(".vk-cri").join(leaf))
    }

    #[cfg(target_os = "windows")]
    {
        let _ = system_path;
        dirs::data_local_dir()
            .map(|d| d.join("vk-cri").join(leaf))
            .unwrap_or_else(|| PathBuf::from("vk-cri").join(leaf))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = leaf;
        PathBuf::from(system_path)
    }
}

/// Returns the orchestrator's name for the host operating system.
fn default_operating_system() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }

    #[cfg(target_os = "macos")]
    {
        "darwin"
    }

    #[cfg(target_os = "windows")]
    {
        "windows"
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "unknown"
    }
}
