//! Tests for constants module.
//!
//! Pins values the runtime and the orchestrator depend on and checks that
//! limits stay in sane ranges.

use std::time::Duration;
use vkcri::*;

// =============================================================================
// Script Pod Contract
// =============================================================================

#[test]
fn test_script_pod_annotation() {
    assert_eq!(POD_TYPE_ANNOTATION, "type");
    assert_eq!(SCRIPT_POD_TYPE, "bash");
}

#[test]
fn test_script_outcome_values() {
    assert_eq!(SCRIPT_FAILURE_EXIT_CODE, -9999);
    assert_eq!(REASON_COMPLETED, "Completed");
    assert_eq!(REASON_ERROR, "Error");
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn test_sync_interval_and_rpc_timeout() {
    assert_eq!(DEFAULT_STATUS_SYNC_INTERVAL, Duration::from_secs(5));
    assert_eq!(DEFAULT_RPC_TIMEOUT, Duration::from_secs(10));
}

// =============================================================================
// Node Defaults
// =============================================================================

#[test]
fn test_node_defaults() {
    assert_eq!(DEFAULT_DAEMON_PORT, 10250);
    assert_eq!(DEFAULT_NODE_MEMORY, 500 * 1024 * 1024 * 1024);
    assert_eq!(DEFAULT_MAX_PODS, "200");
    assert_eq!(INITIAL_ATTEMPT, 0);
}

#[test]
fn test_directory_permissions_not_world_writable() {
    assert_eq!(POD_LOG_ROOT_PERMS & 0o002, 0);
    assert_eq!(POD_VOL_ROOT_PERMS & 0o002, 0);
}

// =============================================================================
// Manifest Limits
// =============================================================================

#[test]
fn test_name_limits_match_rfc1123() {
    assert_eq!(MAX_NAME_LEN, 253);
    assert_eq!(MAX_NAMESPACE_LEN, 63);
    assert_eq!(MAX_CONTAINER_NAME_LEN, 63);
}

#[test]
fn test_manifest_limits_reasonable() {
    assert!(MAX_MANIFEST_SIZE >= 64 * 1024, "manifest limit too restrictive");
    assert!(MAX_CONTAINERS_PER_POD >= 2);
    assert!(MAX_ENV_VARS_PER_CONTAINER >= 64);
}
