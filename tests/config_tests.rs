//! Tests for provider configuration loading and validation.

use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use vkcri::{Error, ProviderConfig, DEFAULT_DAEMON_PORT};

#[test]
fn test_default_config_is_valid() {
    let config = ProviderConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.daemon_endpoint_port, DEFAULT_DAEMON_PORT);
    assert_eq!(config.status_sync_interval(), Duration::from_secs(5));
    assert_eq!(config.rpc_timeout(), Duration::from_secs(10));
}

#[test]
fn test_empty_document_yields_defaults() {
    let config = ProviderConfig::from_yaml(b"  \n").unwrap();
    assert_eq!(config, ProviderConfig::default());
}

#[test]
fn test_from_yaml_camel_case_fields() {
    let yaml = br#"
nodeName: edge-01
operatingSystem: linux
daemonEndpointPort: 10255
internalIp: 10.0.0.12
resourceCpu: "8"
resourceMemory: 64Gi
maxPods: "50"
podLogRoot: /tmp/vk/logs
podVolRoot: /tmp/vk/volumes
statusSyncIntervalSecs: 2
rpcTimeoutSecs: 3
"#;

    let config = ProviderConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.node_name, "edge-01");
    assert_eq!(config.daemon_endpoint_port, 10255);
    assert_eq!(config.internal_ip, "10.0.0.12");
    assert_eq!(config.resource_cpu, "8");
    assert_eq!(config.resource_memory, "64Gi");
    assert_eq!(config.max_pods, "50");
    assert_eq!(config.pod_log_root, PathBuf::from("/tmp/vk/logs"));
    assert_eq!(config.pod_vol_root, PathBuf::from("/tmp/vk/volumes"));
    assert_eq!(config.status_sync_interval(), Duration::from_secs(2));
    assert_eq!(config.rpc_timeout(), Duration::from_secs(3));
}

#[test]
fn test_partial_yaml_keeps_other_defaults() {
    let config = ProviderConfig::from_yaml(b"internalIp: 192.168.1.5\n").unwrap();

    assert_eq!(config.internal_ip, "192.168.1.5");
    assert_eq!(config.node_name, ProviderConfig::default().node_name);
}

#[test]
fn test_validation_rejects_bad_values() {
    for yaml in [
        &b"nodeName: \"\"\n"[..],
        &b"statusSyncIntervalSecs: 0\n"[..],
        &b"rpcTimeoutSecs: 0\n"[..],
    ] {
        let err = ProviderConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }
}

#[test]
fn test_malformed_yaml_is_serialization_error() {
    let err = ProviderConfig::from_yaml(b"nodeName: [unterminated\n").unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "nodeName: from-file\n").unwrap();

    let config = ProviderConfig::load(&path).unwrap();

    assert_eq!(config.node_name, "from-file");
}

#[test]
fn test_load_missing_file() {
    let err = ProviderConfig::load("/nonexistent/vk-cri.yaml").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
