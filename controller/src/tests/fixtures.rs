use crate::api::ControllerError;
use crate::core::pod_repository::PodRepositoryImpl;
use crate::core::{ClusterGateway, PodRepository};
use crate::database::PodDataBase;
use async_trait::async_trait;
use definition::pod::{Pod, PodEnv, PodPort, Protocol, PullPolicy, RestartPolicy, SyncStatus};
use k8s_openapi::api::apps::v1::Deployment;
use rstest::fixture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[fixture]
pub fn db_connection() -> Arc<PodDataBase> {
    let location = std::env::temp_dir().join("pod-controller-test");
    let db = PodDataBase::new(location, format!("test-{}", Uuid::new_v4()));
    db.init_tables().unwrap();
    db
}

#[fixture]
pub fn sample_pod() -> Pod {
    Pod {
        id: 0,
        name: "web-1".to_string(),
        namespace: "default".to_string(),
        team_id: 1,
        min_cpu: None,
        max_cpu: Some(0.5),
        min_memory: None,
        max_memory: Some(256.0),
        image: "nginx:latest".to_string(),
        pull_policy: PullPolicy::IfNotPresent,
        restart_policy: RestartPolicy::Always,
        deploy_type: "deployment".to_string(),
        replicas: 2,
        ports: vec![PodPort {
            port: 80,
            protocol: Protocol::TCP,
        }],
        envs: vec![PodEnv {
            key: "MODE".to_string(),
            value: "prod".to_string(),
        }],
        sync_status: SyncStatus::Pending,
    }
}

/// In-memory cluster keyed by `namespace/name`
#[derive(Clone, Default)]
pub struct FakeCluster {
    workloads: Arc<Mutex<HashMap<String, Deployment>>>,
    pub reject_writes: Arc<AtomicBool>,
    pub unavailable: Arc<AtomicBool>,
}

impl FakeCluster {
    fn key(namespace: &str, name: &str) -> String {
        format!("{}/{}", namespace, name)
    }

    fn descriptor_key(descriptor: &Deployment) -> String {
        FakeCluster::key(
            descriptor.metadata.namespace.as_deref().unwrap_or_default(),
            descriptor.metadata.name.as_deref().unwrap_or_default(),
        )
    }

    pub fn insert(&self, descriptor: &Deployment) {
        self.workloads
            .lock()
            .unwrap()
            .insert(FakeCluster::descriptor_key(descriptor), descriptor.clone());
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.get(namespace, name).is_some()
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.workloads
            .lock()
            .unwrap()
            .get(&FakeCluster::key(namespace, name))
            .cloned()
    }

    fn check(&self, write: bool) -> Result<(), ControllerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ControllerError::BackendUnavailable(
                "connection refused".to_string(),
            ));
        }
        if write && self.reject_writes.load(Ordering::SeqCst) {
            return Err(ControllerError::BackendRejected("forbidden".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterGateway for FakeCluster {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool, ControllerError> {
        self.check(false)?;
        Ok(self.contains(namespace, name))
    }

    async fn create(&self, descriptor: &Deployment) -> Result<(), ControllerError> {
        self.check(true)?;
        let key = FakeCluster::descriptor_key(descriptor);
        let mut workloads = self.workloads.lock().unwrap();
        if workloads.contains_key(&key) {
            return Err(ControllerError::AlreadyExists(key));
        }
        workloads.insert(key, descriptor.clone());
        Ok(())
    }

    async fn update(&self, descriptor: &Deployment) -> Result<(), ControllerError> {
        self.check(true)?;
        let key = FakeCluster::descriptor_key(descriptor);
        let mut workloads = self.workloads.lock().unwrap();
        match workloads.get_mut(&key) {
            Some(live) => {
                *live = descriptor.clone();
                Ok(())
            }
            None => Err(ControllerError::NotFound(key)),
        }
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        self.check(true)?;
        let key = FakeCluster::key(namespace, name);
        match self.workloads.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(ControllerError::NotFound(key)),
        }
    }
}

/// Registry whose writes can be switched to fail, the status flag excepted
#[derive(Clone)]
pub struct FaultyRepository {
    inner: Arc<PodRepositoryImpl>,
    pub fail_writes: Arc<AtomicBool>,
}

impl FaultyRepository {
    pub fn new(inner: PodRepositoryImpl) -> FaultyRepository {
        FaultyRepository {
            inner: Arc::new(inner),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check(&self) -> Result<(), ControllerError> {
        match self.fail_writes.load(Ordering::SeqCst) {
            true => Err(ControllerError::Database(rusqlite::Error::InvalidQuery)),
            false => Ok(()),
        }
    }
}

impl PodRepository for FaultyRepository {
    fn register_pod(&self, pod: &Pod) -> Result<i64, ControllerError> {
        self.check()?;
        self.inner.register_pod(pod)
    }

    fn fetch_pod(&self, id: i64) -> Result<Pod, ControllerError> {
        self.inner.fetch_pod(id)
    }

    fn fetch_pod_by_name(&self, name: &str) -> Result<Option<Pod>, ControllerError> {
        self.inner.fetch_pod_by_name(name)
    }

    fn fetch_all_pods(&self) -> Result<Vec<Pod>, ControllerError> {
        self.inner.fetch_all_pods()
    }

    fn fetch_pods_by_status(&self, status: SyncStatus) -> Result<Vec<Pod>, ControllerError> {
        self.inner.fetch_pods_by_status(status)
    }

    fn update_pod(&self, pod: &Pod) -> Result<(), ControllerError> {
        self.check()?;
        self.inner.update_pod(pod)
    }

    fn delete_pod(&self, id: i64) -> Result<(), ControllerError> {
        self.check()?;
        self.inner.delete_pod(id)
    }

    fn mark_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), ControllerError> {
        self.inner.mark_sync_status(id, status)
    }
}
