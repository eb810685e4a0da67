//! Tests for error types.
//!
//! Validates display formatting, not-found classification and conversions.

use std::path::PathBuf;
use std::time::Duration;
use vkcri::Error;

// =============================================================================
// Lookup Error Tests
// =============================================================================

#[test]
fn test_pod_not_found_display() {
    let err = Error::PodNotFound {
        namespace: "default".to_string(),
        name: "web".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("default/web"), "should include pod key");
    assert!(msg.contains("could not be found"));
    assert!(err.is_not_found());
}

#[test]
fn test_pod_uid_not_found_display() {
    let err = Error::PodUidNotFound("1234-abcd".to_string());

    assert!(err.to_string().contains("1234-abcd"));
    assert!(err.is_not_found());
}

#[test]
fn test_container_not_found_display() {
    let err = Error::ContainerNotFound {
        namespace: "default".to_string(),
        pod: "web".to_string(),
        container: "sidecar".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("sidecar"));
    assert!(msg.contains("default/web"));
    assert!(err.is_not_found());
}

// =============================================================================
// Runtime Error Tests
// =============================================================================

#[test]
fn test_runtime_error_display() {
    let err = Error::runtime("RunPodSandbox", "network plugin not ready");
    let msg = format!("{}", err);

    assert!(msg.contains("RunPodSandbox"), "should include operation");
    assert!(msg.contains("network plugin not ready"), "should include reason");
    assert!(!err.is_not_found());
}

#[test]
fn test_timeout_display() {
    let err = Error::Timeout {
        operation: "PullImage".to_string(),
        duration: Duration::from_secs(10),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("PullImage"));
    assert!(msg.contains("timed out"));
    assert!(msg.contains("10s"));
}

#[test]
fn test_cancelled_display() {
    let err = Error::Cancelled("ListPodSandbox".to_string());
    assert!(err.to_string().contains("cancelled"));
}

// =============================================================================
// I/O and Conversion Tests
// =============================================================================

#[test]
fn test_local_io_display_and_source() {
    use std::error::Error as _;

    let err = Error::LocalIo {
        path: PathBuf::from("/run/vk-cri/volumes/uid"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };

    assert!(err.to_string().contains("/run/vk-cri/volumes/uid"));
    assert!(err.source().is_some(), "should expose the I/O cause");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();

    assert!(matches!(err, Error::Io(_)));
    assert!(!err.is_not_found(), "I/O not-found is not a pod lookup miss");
}

#[test]
fn test_yaml_error_conversion() {
    let yaml_err = serde_yaml::from_str::<u32>("not a number").unwrap_err();
    let err: Error = yaml_err.into();

    assert!(matches!(err, Error::Serialization(_)));
}

#[test]
fn test_errors_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
