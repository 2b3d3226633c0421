use crate::api::ControllerError;
use async_trait::async_trait;
use definition::pod::{Pod, SyncStatus};
use k8s_openapi::api::apps::v1::Deployment;

pub mod cluster_gateway;
pub mod descriptor;
pub mod pod_repository;
pub mod pod_service;

/// Thin typed access to the workload API of the cluster.
/// Every call is a single request, failures are never retried here.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// `false` when the workload is absent, an error only when the cluster can't answer
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool, ControllerError>;
    async fn create(&self, descriptor: &Deployment) -> Result<(), ControllerError>;
    /// Replaces the live workload wholesale
    async fn update(&self, descriptor: &Deployment) -> Result<(), ControllerError>;
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), ControllerError>;
}

/// Relational persistence of pods. Each write is one transaction covering the
/// pod row and its ports and envs.
pub trait PodRepository: Send + Sync {
    fn register_pod(&self, pod: &Pod) -> Result<i64, ControllerError>;
    fn fetch_pod(&self, id: i64) -> Result<Pod, ControllerError>;
    fn fetch_pod_by_name(&self, name: &str) -> Result<Option<Pod>, ControllerError>;
    fn fetch_all_pods(&self) -> Result<Vec<Pod>, ControllerError>;
    fn fetch_pods_by_status(&self, status: SyncStatus) -> Result<Vec<Pod>, ControllerError>;
    fn update_pod(&self, pod: &Pod) -> Result<(), ControllerError>;
    fn delete_pod(&self, id: i64) -> Result<(), ControllerError>;
    fn mark_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), ControllerError>;
}

#[async_trait]
pub trait PodService: Send + Sync {
    async fn create_pod(&self, pod: Pod) -> Result<Pod, ControllerError>;
    async fn update_pod(&self, pod: Pod) -> Result<Pod, ControllerError>;
    async fn delete_pod(&self, id: i64) -> Result<Pod, ControllerError>;
    fn find_pod_by_id(&self, id: i64) -> Result<Pod, ControllerError>;
    fn find_all_pods(&self) -> Result<Vec<Pod>, ControllerError>;
    fn find_diverged_pods(&self) -> Result<Vec<Pod>, ControllerError>;
}
