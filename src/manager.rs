//! Pod and container state cache.
//!
//! Two partitions keyed by pod UID:
//!
//! - **managed**: rebuilt wholesale from a runtime listing on every refresh
//!   and published with a single pointer swap. Readers clone the `Arc` and
//!   iterate a generation that can never change under them.
//! - **scripted**: records for local-process pods, created and mutated by
//!   the script path and removed on deletion.
//!
//! A UID lives in at most one partition; dispatch by annotation decides
//! which.

use crate::cri::{ContainerStatus, PodSandboxState, PodSandboxStatus};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cached view of one pod: its sandbox and every container in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxRecord {
    /// Runtime-assigned sandbox ID (the pod UID for script pods).
    pub id: String,
    pub status: PodSandboxStatus,
    /// Container name → last reported status.
    pub containers: HashMap<String, ContainerStatus>,
}

impl SandboxRecord {
    pub fn new(id: impl Into<String>, status: PodSandboxStatus) -> Self {
        Self {
            id: id.into(),
            status,
            containers: HashMap::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.status.metadata.uid
    }

    /// True when the record belongs to `namespace/name`.
    pub fn matches_name(&self, namespace: &str, name: &str) -> bool {
        self.status.metadata.namespace == namespace && self.status.metadata.name == name
    }

    pub fn is_ready(&self) -> bool {
        self.status.state == PodSandboxState::Ready
    }
}

/// One cache partition: pod UID → record.
pub type Partition = HashMap<String, SandboxRecord>;

/// Owner of both cache partitions.
///
/// Shared by handle between the provider, its notification loops and the
/// script tasks; only the provider writes.
#[derive(Debug, Default)]
pub struct PodManager {
    managed: RwLock<Arc<Partition>>,
    scripted: RwLock<Partition>,
}

impl PodManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Managed Partition
    // =========================================================================

    /// Current generation of the managed partition.
    pub fn managed(&self) -> Result<Arc<Partition>> {
        let guard = self
            .managed
            .read()
            .map_err(|_| Error::Internal("managed cache lock poisoned".to_string()))?;
        Ok(Arc::clone(&guard))
    }

    /// Publishes a freshly built managed partition.
    pub fn replace_managed(&self, partition: Partition) -> Result<()> {
        let mut guard = self
            .managed
            .write()
            .map_err(|_| Error::Internal("managed cache lock poisoned".to_string()))?;
        *guard = Arc::new(partition);
        Ok(())
    }

    /// Drops one record from the managed partition, publishing a new generation.
    pub fn remove_managed(&self, uid: &str) -> Result<Option<SandboxRecord>> {
        let mut guard = self
            .managed
            .write()
            .map_err(|_| Error::Internal("managed cache lock poisoned".to_string()))?;
        if !guard.contains_key(uid) {
            return Ok(None);
        }
        let mut next = Partition::clone(&guard);
        let removed = next.remove(uid);
        *guard = Arc::new(next);
        Ok(removed)
    }

    pub fn managed_by_uid(&self, uid: &str) -> Result<Option<SandboxRecord>> {
        Ok(self.managed()?.get(uid).cloned())
    }

    /// Finds a managed record by namespace and name.
    pub fn find_managed_by_name(&self, namespace: &str, name: &str) -> Result<Option<SandboxRecord>> {
        Ok(self
            .managed()?
            .values()
            .find(|r| r.matches_name(namespace, name))
            .cloned())
    }

    // =========================================================================
    // Scripted Partition
    // =========================================================================

    /// Inserts a script pod record. Returns false if the UID is already cached.
    pub fn insert_scripted(&self, uid: &str, record: SandboxRecord) -> Result<bool> {
        let mut guard = self.scripted_write()?;
        if guard.contains_key(uid) {
            return Ok(false);
        }
        guard.insert(uid.to_string(), record);
        Ok(true)
    }

    /// Applies `f` to one container of a script pod.
    ///
    /// Returns false when the pod or container is gone (deleted meanwhile).
    pub fn update_scripted_container<F>(&self, uid: &str, container: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut ContainerStatus),
    {
        let mut guard = self.scripted_write()?;
        match guard
            .get_mut(uid)
            .and_then(|r| r.containers.get_mut(container))
        {
            Some(status) => {
                f(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Adds a container to an existing script pod record.
    pub fn insert_scripted_container(&self, uid: &str, status: ContainerStatus) -> Result<bool> {
        let mut guard = self.scripted_write()?;
        match guard.get_mut(uid) {
            Some(record) => {
                record.containers.insert(status.metadata.name.clone(), status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_scripted(&self, uid: &str) -> Result<Option<SandboxRecord>> {
        Ok(self.scripted_write()?.remove(uid))
    }

    pub fn scripted_by_uid(&self, uid: &str) -> Result<Option<SandboxRecord>> {
        Ok(self.scripted_read()?.get(uid).cloned())
    }

    pub fn find_scripted_by_name(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SandboxRecord>> {
        Ok(self
            .scripted_read()?
            .values()
            .find(|r| r.matches_name(namespace, name))
            .cloned())
    }

    /// Point-in-time copy of every script pod record.
    pub fn scripted(&self) -> Result<Vec<SandboxRecord>> {
        Ok(self.scripted_read()?.values().cloned().collect())
    }

    fn scripted_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Partition>> {
        self.scripted
            .read()
            .map_err(|_| Error::Internal("scripted cache lock poisoned".to_string()))
    }

    fn scripted_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Partition>> {
        self.scripted
            .write()
            .map_err(|_| Error::Internal("scripted cache lock poisoned".to_string()))
    }

    // =========================================================================
    // Both Partitions
    // =========================================================================

    /// Finds a pod by name in either partition, managed first.
    pub fn find_by_name(&self, namespace: &str, name: &str) -> Result<Option<SandboxRecord>> {
        match self.find_managed_by_name(namespace, name)? {
            Some(record) => Ok(Some(record)),
            None => self.find_scripted_by_name(namespace, name),
        }
    }

    /// Every cached record, managed then scripted.
    pub fn all(&self) -> Result<Vec<SandboxRecord>> {
        let mut records: Vec<SandboxRecord> = self.managed()?.values().cloned().collect();
        records.extend(self.scripted()?);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cri::PodSandboxMetadata;

    fn record(uid: &str, name: &str) -> SandboxRecord {
        SandboxRecord::new(
            format!("sb-{uid}"),
            PodSandboxStatus {
                id: format!("sb-{uid}"),
                metadata: PodSandboxMetadata {
                    name: name.to_string(),
                    namespace: "default".to_string(),
                    uid: uid.to_string(),
                    attempt: 0,
                },
                ..Default::default()
            },
        )
    }

    #[test]
    fn snapshot_survives_replace() {
        let pm = PodManager::new();
        pm.replace_managed(Partition::from([("a".to_string(), record("a", "web"))]))
            .unwrap();

        let before = pm.managed().unwrap();
        pm.replace_managed(Partition::new()).unwrap();

        assert_eq!(before.len(), 1, "old generation must stay intact");
        assert!(pm.managed().unwrap().is_empty());
    }

    #[test]
    fn remove_managed_publishes_new_generation() {
        let pm = PodManager::new();
        pm.replace_managed(Partition::from([
            ("a".to_string(), record("a", "web")),
            ("b".to_string(), record("b", "db")),
        ]))
        .unwrap();
        let before = pm.managed().unwrap();

        let removed = pm.remove_managed("a").unwrap();

        assert_eq!(removed.map(|r| r.id), Some("sb-a".to_string()));
        assert_eq!(before.len(), 2);
        assert_eq!(pm.managed().unwrap().len(), 1);
        assert!(pm.remove_managed("missing").unwrap().is_none());
    }

    #[test]
    fn scripted_insert_is_first_writer_wins() {
        let pm = PodManager::new();
        assert!(pm.insert_scripted("a", record("a", "job")).unwrap());
        assert!(!pm.insert_scripted("a", record("a", "other")).unwrap());
        assert_eq!(
            pm.scripted_by_uid("a").unwrap().unwrap().status.metadata.name,
            "job"
        );
    }

    #[test]
    fn find_by_name_checks_both_partitions() {
        let pm = PodManager::new();
        pm.replace_managed(Partition::from([("a".to_string(), record("a", "web"))]))
            .unwrap();
        pm.insert_scripted("b", record("b", "job")).unwrap();

        assert_eq!(pm.find_by_name("default", "web").unwrap().unwrap().uid(), "a");
        assert_eq!(pm.find_by_name("default", "job").unwrap().unwrap().uid(), "b");
        assert!(pm.find_by_name("other", "web").unwrap().is_none());
        assert_eq!(pm.all().unwrap().len(), 2);
    }
}
