//! Script-backed pods: one local OS process per container, no runtime.
//!
//! Container lifecycle as seen through the cache:
//!
//! ```text
//! Created ("Creating") → Running ("Running") → Exited
//!                                               ├─ exit 0:  "Completed", stdout
//!                                               └─ failure: "Error", stderr, -9999
//! ```
//!
//! Each transition signals the event loop. The process runs in its own task
//! and is killed when the pod is deleted or the provider shuts down.

use super::notify::Notifier;
use super::CriProvider;
use crate::constants::{
    INITIAL_ATTEMPT, REASON_COMPLETED, REASON_ERROR, SCRIPT_FAILURE_EXIT_CODE,
};
use crate::cri::{
    ContainerMetadata, ContainerState, ContainerStatus, ImageSpec, PodSandboxMetadata,
    PodSandboxState, PodSandboxStatus,
};
use crate::error::{Error, Result};
use crate::manager::{PodManager, SandboxRecord};
use crate::pod::{ContainerSpec, Pod};
use crate::project::{self, now_unix_nanos};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// A container's process, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptCommand {
    pub container: String,
    pub program: String,
    pub args: Vec<String>,
}

impl ScriptCommand {
    /// First command token is the program; the rest of the command and the
    /// declared args follow. `None` when the command is empty.
    pub(crate) fn from_container(container: &ContainerSpec) -> Option<Self> {
        let (program, rest) = container.command.split_first()?;
        Some(Self {
            container: container.name.clone(),
            program: program.clone(),
            args: rest.iter().chain(container.args.iter()).cloned().collect(),
        })
    }
}

/// Outcome of one finished process.
struct Completion {
    exit_code: i32,
    reason: &'static str,
    message: String,
}

impl CriProvider {
    pub(super) async fn create_scripted(&self, pod: &Pod) -> Result<()> {
        let uid = pod.uid().to_string();
        let commands: Vec<ScriptCommand> = pod
            .spec
            .containers
            .iter()
            .filter_map(ScriptCommand::from_container)
            .collect();

        let record = SandboxRecord::new(uid.clone(), sandbox_status(pod));
        if !self.pods.insert_scripted(&uid, record)? {
            tracing::info!(pod = %pod.key(), uid = %uid, "script pod already exists");
            return Ok(());
        }

        let token = self.cancel.child_token();
        match self.script_tasks.lock() {
            Ok(mut tasks) => {
                tasks.insert(uid.clone(), token.clone());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(uid.clone(), token.clone());
            }
        }
        self.notifier.signal().await;

        for command in commands {
            let container = pod
                .spec
                .containers
                .iter()
                .find(|c| c.name == command.container);
            let image = container.map(|c| c.image.clone()).unwrap_or_default();

            self.pods
                .insert_scripted_container(&uid, created_status(&uid, &command.container, &image))?;
            self.notifier.signal().await;

            self.pods
                .update_scripted_container(&uid, &command.container, |status| {
                    status.state = ContainerState::Running;
                    status.started_at = now_unix_nanos();
                    status.message = "Running".to_string();
                })?;
            self.notifier.signal().await;

            tracing::info!(
                pod = %pod.key(),
                container = %command.container,
                program = %command.program,
                "starting script process"
            );
            tokio::spawn(run_script(
                Arc::clone(&self.pods),
                Arc::clone(&self.notifier),
                uid.clone(),
                command,
                token.clone(),
            ));
        }

        if let Some(record) = self.pods.scripted_by_uid(&uid)? {
            self.notifier
                .push(project::pod_from_record(&record, &self.config.node_name));
        }
        Ok(())
    }

    pub(super) fn delete_scripted(&self, pod: &Pod) -> Result<()> {
        let uid = pod.uid();
        let removed = self.pods.remove_scripted(uid)?;

        let token = match self.script_tasks.lock() {
            Ok(mut tasks) => tasks.remove(uid),
            Err(poisoned) => poisoned.into_inner().remove(uid),
        };
        if let Some(token) = token {
            token.cancel();
        }

        let mut record = removed.ok_or_else(|| Error::PodUidNotFound(uid.to_string()))?;
        let now = now_unix_nanos();
        record.status.state = PodSandboxState::NotReady;
        for status in record.containers.values_mut() {
            if status.state != ContainerState::Exited {
                status.state = ContainerState::Exited;
                status.finished_at = now;
            }
        }

        tracing::info!(pod = %pod.key(), uid = %uid, "script pod removed");
        self.notifier
            .push(project::pod_from_record(&record, &self.config.node_name));
        Ok(())
    }
}

fn sandbox_status(pod: &Pod) -> PodSandboxStatus {
    PodSandboxStatus {
        id: pod.uid().to_string(),
        metadata: PodSandboxMetadata {
            name: pod.metadata.name.clone(),
            namespace: pod.metadata.namespace.clone(),
            uid: pod.uid().to_string(),
            attempt: INITIAL_ATTEMPT,
        },
        state: PodSandboxState::Ready,
        created_at: now_unix_nanos(),
        network: None,
        labels: pod.metadata.labels.clone(),
        annotations: pod.metadata.annotations.clone(),
    }
}

fn created_status(uid: &str, container: &str, image: &str) -> ContainerStatus {
    ContainerStatus {
        id: format!("{uid}-{container}"),
        metadata: ContainerMetadata {
            name: container.to_string(),
            attempt: INITIAL_ATTEMPT,
        },
        state: ContainerState::Created,
        created_at: now_unix_nanos(),
        image: (!image.is_empty()).then(|| ImageSpec::new(image)),
        message: "Creating".to_string(),
        ..Default::default()
    }
}

/// Runs one container's process to completion and records the outcome.
async fn run_script(
    pods: Arc<PodManager>,
    notifier: Arc<Notifier>,
    uid: String,
    command: ScriptCommand,
    cancel: CancellationToken,
) {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(uid = %uid, container = %command.container, "script process cancelled");
            return;
        }
        output = cmd.output() => output,
    };

    let completion = match output {
        Ok(out) if out.status.success() => Completion {
            exit_code: 0,
            reason: REASON_COMPLETED,
            message: String::from_utf8_lossy(&out.stdout).into_owned(),
        },
        Ok(out) => Completion {
            exit_code: SCRIPT_FAILURE_EXIT_CODE,
            reason: REASON_ERROR,
            message: String::from_utf8_lossy(&out.stderr).into_owned(),
        },
        Err(e) => Completion {
            exit_code: SCRIPT_FAILURE_EXIT_CODE,
            reason: REASON_ERROR,
            message: e.to_string(),
        },
    };
    tracing::info!(
        uid = %uid,
        container = %command.container,
        exit_code = completion.exit_code,
        reason = completion.reason,
        "script process finished"
    );

    let updated = pods.update_scripted_container(&uid, &command.container, |status| {
        status.state = ContainerState::Exited;
        status.finished_at = now_unix_nanos();
        status.exit_code = completion.exit_code;
        status.reason = completion.reason.to_string();
        status.message = completion.message;
    });
    match updated {
        Ok(true) => notifier.signal().await,
        Ok(false) => {}
        Err(e) => tracing::warn!(uid = %uid, error = %e, "failed to record script outcome"),
    }
}
