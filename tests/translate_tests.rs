//! Tests for pod to runtime request translation.

use std::path::Path;
use vkcri::cri::Protocol;
use vkcri::translate::{
    build_container_config, build_sandbox_config, container_log_file, pod_log_dir,
    pod_volume_dir, LABEL_CONTAINER_NAME, LABEL_POD_NAME, LABEL_POD_NAMESPACE, LABEL_POD_UID,
};
use vkcri::{Error, Pod};

fn sample_pod() -> Pod {
    Pod::from_yaml(
        br#"
metadata:
  name: web
  namespace: shop
  uid: 7f1c-uid
  labels:
    tier: frontend
  annotations:
    owner: team-a
spec:
  containers:
    - name: nginx
      image: nginx:1.25
      command: ["nginx"]
      args: ["-g", "daemon off;"]
      workingDir: /usr/share/nginx
      stdin: true
      stdinOnce: true
      tty: true
      ports:
        - containerPort: 80
          hostPort: 8080
        - containerPort: 53
          protocol: UDP
      env:
        - name: WORKERS
          value: "4"
    - name: sidecar
      image: busybox
      ports:
        - containerPort: 9090
          hostIP: 127.0.0.1
"#,
    )
    .unwrap()
}

// =============================================================================
// Path Naming
// =============================================================================

#[test]
fn test_pod_directories_are_keyed_by_uid() {
    let pod = sample_pod();

    assert_eq!(
        pod_log_dir(Path::new("/var/log/vk"), &pod),
        Path::new("/var/log/vk/7f1c-uid")
    );
    assert_eq!(
        pod_volume_dir(Path::new("/run/vk"), &pod),
        Path::new("/run/vk/7f1c-uid")
    );
}

#[test]
fn test_container_log_file_format() {
    assert_eq!(container_log_file("nginx", 0), "nginx-0.log");
}

// =============================================================================
// Sandbox Config
// =============================================================================

#[test]
fn test_sandbox_config_identity_matches_pod() {
    let pod = sample_pod();

    let config = build_sandbox_config(&pod, Path::new("/logs/7f1c-uid"), 0).unwrap();

    assert_eq!(config.metadata.name, "web");
    assert_eq!(config.metadata.namespace, "shop");
    assert_eq!(config.metadata.uid, "7f1c-uid");
    assert_eq!(config.metadata.attempt, 0);
    assert_eq!(config.hostname, "web");
    assert_eq!(config.log_directory, "/logs/7f1c-uid");
    assert_eq!(config.labels.get("tier").map(String::as_str), Some("frontend"));
    assert_eq!(config.annotations.get("owner").map(String::as_str), Some("team-a"));
}

#[test]
fn test_sandbox_config_collects_ports_from_all_containers() {
    let pod = sample_pod();

    let config = build_sandbox_config(&pod, Path::new("/logs"), 0).unwrap();

    assert_eq!(config.port_mappings.len(), 3);
    assert_eq!(config.port_mappings[0].container_port, 80);
    assert_eq!(config.port_mappings[0].host_port, 8080);
    assert_eq!(config.port_mappings[0].protocol, Protocol::Tcp);
    assert_eq!(config.port_mappings[1].protocol, Protocol::Udp);
    assert_eq!(config.port_mappings[1].host_port, 0);
    assert_eq!(config.port_mappings[2].host_ip, "127.0.0.1");
}

#[test]
fn test_sandbox_config_rejects_missing_identity() {
    let mut pod = sample_pod();
    pod.metadata.uid.clear();

    let err = build_sandbox_config(&pod, Path::new("/logs"), 0).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_translation_does_not_mutate_pod() {
    let pod = sample_pod();
    let before = pod.clone();

    build_sandbox_config(&pod, Path::new("/logs"), 0).unwrap();
    build_container_config(&pod.spec.containers[0], &pod, "sha256:abc", Path::new("/v"), 0)
        .unwrap();

    assert_eq!(pod, before);
}

// =============================================================================
// Container Config
// =============================================================================

#[test]
fn test_container_config_fields() {
    let pod = sample_pod();
    let container = &pod.spec.containers[0];

    let config =
        build_container_config(container, &pod, "docker.io/library/nginx@sha256:abc", Path::new("/v"), 0)
            .unwrap();

    assert_eq!(config.metadata.name, "nginx");
    assert_eq!(config.image.image, "docker.io/library/nginx@sha256:abc");
    assert_eq!(config.command, vec!["nginx"]);
    assert_eq!(config.args, vec!["-g", "daemon off;"]);
    assert_eq!(config.working_dir, "/usr/share/nginx");
    assert_eq!(config.log_path, "nginx-0.log");
    assert!(config.stdin);
    assert!(config.stdin_once);
    assert!(config.tty);
    assert_eq!(config.envs.len(), 1);
    assert_eq!(config.envs[0].key, "WORKERS");
    assert_eq!(config.envs[0].value, "4");
}

#[test]
fn test_container_config_labels_identify_pod() {
    let pod = sample_pod();

    let config =
        build_container_config(&pod.spec.containers[1], &pod, "busybox", Path::new("/v"), 0)
            .unwrap();

    assert_eq!(config.labels[LABEL_POD_NAME], "web");
    assert_eq!(config.labels[LABEL_POD_NAMESPACE], "shop");
    assert_eq!(config.labels[LABEL_POD_UID], "7f1c-uid");
    assert_eq!(config.labels[LABEL_CONTAINER_NAME], "sidecar");
}

#[test]
fn test_container_config_requires_resolved_image() {
    let pod = sample_pod();

    let err = build_container_config(&pod.spec.containers[0], &pod, "", Path::new("/v"), 0)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}
