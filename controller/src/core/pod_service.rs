use crate::api::{ControllerError, Crud};
use crate::core::descriptor::DescriptorBuilder;
use crate::core::{ClusterGateway, PodRepository, PodService};
use async_trait::async_trait;
use definition::pod::{Pod, SyncStatus};
use tracing::{event, Level};

/// Drives every pod operation against the cluster and the registry.
///
/// Mutations always reach the cluster first, then the registry. Nothing spans
/// both stores, so a registry failure after the cluster accepted a change is
/// reported as a divergence: the caller never sees a success, the cluster side
/// is left as is, and the registry row (when there is one) is flagged as
/// `diverged` so it can be found and repaired later.
pub struct PodServiceImpl<G, R> {
    gateway: G,
    repository: R,
    builder: DescriptorBuilder,
}

impl<G: ClusterGateway, R: PodRepository> PodServiceImpl<G, R> {
    pub fn new(gateway: G, repository: R, builder: DescriptorBuilder) -> PodServiceImpl<G, R> {
        PodServiceImpl {
            gateway,
            repository,
            builder,
        }
    }

    fn divergence(&self, operation: Crud, pod: &Pod, error: ControllerError) -> ControllerError {
        event!(
            Level::ERROR,
            "Pod {} diverged during {}: cluster updated, registry failed with {}",
            pod.get_full_name(),
            operation,
            error
        );
        if operation != Crud::Create {
            if let Err(e) = self.repository.mark_sync_status(pod.id, SyncStatus::Diverged) {
                event!(
                    Level::ERROR,
                    "Could not flag pod {} as diverged: {}",
                    pod.get_full_name(),
                    e
                );
            }
        }
        ControllerError::Divergence {
            operation,
            pod: pod.name.clone(),
            source: Box::new(error),
        }
    }
}

#[async_trait]
impl<G: ClusterGateway, R: PodRepository> PodService for PodServiceImpl<G, R> {
    async fn create_pod(&self, mut pod: Pod) -> Result<Pod, ControllerError> {
        pod.validate()?;
        if self.gateway.exists(&pod.namespace, &pod.name).await? {
            return Err(ControllerError::AlreadyExists(pod.get_full_name()));
        }
        if self.repository.fetch_pod_by_name(&pod.name)?.is_some() {
            return Err(ControllerError::DuplicateName(pod.name));
        }

        let descriptor = self.builder.build(&pod);
        self.gateway.create(&descriptor).await?;
        event!(Level::INFO, "Workload {} created in cluster", pod.get_full_name());

        pod.sync_status = SyncStatus::Confirmed;
        match self.repository.register_pod(&pod) {
            Ok(id) => {
                pod.id = id;
                event!(Level::INFO, "Pod {} registered with id {}", pod.name, id);
                Ok(pod)
            }
            Err(e) => Err(self.divergence(Crud::Create, &pod, e)),
        }
    }

    async fn update_pod(&self, mut pod: Pod) -> Result<Pod, ControllerError> {
        pod.validate()?;
        let stored = self.repository.fetch_pod(pod.id)?;
        // the name is the only link between the registry row and the workload
        if stored.name != pod.name || stored.namespace != pod.namespace {
            return Err(ControllerError::Validation(format!(
                "pod {} cannot be renamed or moved to {}",
                stored.get_full_name(),
                pod.get_full_name()
            )));
        }
        if !self.gateway.exists(&pod.namespace, &pod.name).await? {
            return Err(ControllerError::NotFound(pod.get_full_name()));
        }

        let descriptor = self.builder.build(&pod);
        self.gateway.update(&descriptor).await?;
        event!(Level::INFO, "Workload {} replaced in cluster", pod.get_full_name());

        pod.sync_status = SyncStatus::Confirmed;
        match self.repository.update_pod(&pod) {
            Ok(()) => {
                event!(Level::INFO, "Pod {} updated", pod.name);
                Ok(pod)
            }
            Err(e) => Err(self.divergence(Crud::Update, &pod, e)),
        }
    }

    async fn delete_pod(&self, id: i64) -> Result<Pod, ControllerError> {
        let pod = self.repository.fetch_pod(id)?;
        if !self.gateway.exists(&pod.namespace, &pod.name).await? {
            return Err(ControllerError::NotFound(pod.get_full_name()));
        }

        self.gateway.delete(&pod.namespace, &pod.name).await?;
        event!(Level::INFO, "Workload {} deleted from cluster", pod.get_full_name());

        match self.repository.delete_pod(id) {
            Ok(()) => {
                event!(Level::INFO, "Pod {} deleted", pod.name);
                Ok(pod)
            }
            Err(e) => Err(self.divergence(Crud::Delete, &pod, e)),
        }
    }

    fn find_pod_by_id(&self, id: i64) -> Result<Pod, ControllerError> {
        self.repository.fetch_pod(id)
    }

    fn find_all_pods(&self) -> Result<Vec<Pod>, ControllerError> {
        self.repository.fetch_all_pods()
    }

    fn find_diverged_pods(&self) -> Result<Vec<Pod>, ControllerError> {
        self.repository.fetch_pods_by_status(SyncStatus::Diverged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pod_repository::PodRepositoryImpl;
    use crate::database::PodDataBase;
    use crate::tests::fixtures::{db_connection, sample_pod, FakeCluster, FaultyRepository};
    use definition::pod::{PodPort, Protocol};
    use rstest::rstest;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    type TestService = PodServiceImpl<FakeCluster, FaultyRepository>;

    fn service(database: Arc<PodDataBase>, cluster: &FakeCluster) -> (TestService, FaultyRepository) {
        let repository = FaultyRepository::new(PodRepositoryImpl::new(database));
        let service = PodServiceImpl::new(
            cluster.clone(),
            repository.clone(),
            DescriptorBuilder::default(),
        );
        (service, repository)
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_then_read(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, _) = service(db_connection, &cluster);

        let created = service.create_pod(sample_pod.clone()).await.unwrap();
        assert!(cluster.contains("default", "web-1"));

        let fetched = service.find_pod_by_id(created.id).unwrap();
        assert_eq!(fetched.name, "web-1");
        assert_eq!(fetched.namespace, "default");
        assert_eq!(fetched.image, "nginx:latest");
        assert_eq!(fetched.replicas, 2);
        assert_eq!(fetched.max_cpu, Some(0.5));
        assert_eq!(fetched.max_memory, Some(256.0));
        assert_eq!(fetched.ports, sample_pod.ports);
        assert_eq!(fetched.envs, sample_pod.envs);
        assert_eq!(fetched.sync_status, SyncStatus::Confirmed);
        assert_eq!(service.find_all_pods().unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_rejected_when_workload_exists(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        cluster.insert(&DescriptorBuilder::default().build(&sample_pod));
        let (service, _) = service(db_connection, &cluster);

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(result, Err(ControllerError::AlreadyExists(_))));
        assert!(service.find_all_pods().unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_rejected_when_name_registered(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        repository.register_pod(&sample_pod).unwrap();

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(result, Err(ControllerError::DuplicateName(_))));
        assert!(!cluster.contains("default", "web-1"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_invalid_pod_touches_nothing(
        db_connection: Arc<PodDataBase>,
        mut sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        let (service, _) = service(db_connection, &cluster);
        sample_pod.replicas = -3;

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(result, Err(ControllerError::Validation(_))));
        assert!(!cluster.contains("default", "web-1"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_cluster_failure_leaves_no_record(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        cluster.reject_writes.store(true, Ordering::SeqCst);
        let (service, _) = service(db_connection, &cluster);

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(result, Err(ControllerError::BackendRejected(_))));
        assert!(service.find_all_pods().unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_divergence_is_reported(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        repository.fail_writes.store(true, Ordering::SeqCst);

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(
            result,
            Err(ControllerError::Divergence {
                operation: Crud::Create,
                ..
            })
        ));
        // the workload stays live, no compensating delete
        assert!(cluster.contains("default", "web-1"));
        assert!(service.find_all_pods().unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_replaces_workload_and_row(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        let (service, _) = service(db_connection, &cluster);
        let mut pod = service.create_pod(sample_pod).await.unwrap();

        pod.replicas = 5;
        pod.ports = vec![PodPort {
            port: 443,
            protocol: Protocol::TCP,
        }];
        service.update_pod(pod.clone()).await.unwrap();

        let live = cluster.get("default", "web-1").unwrap();
        assert_eq!(live.spec.unwrap().replicas, Some(5));
        let stored = service.find_pod_by_id(pod.id).unwrap();
        assert_eq!(stored.replicas, 5);
        assert_eq!(stored.ports, pod.ports);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_rejected_when_workload_missing(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        let mut pod = sample_pod.clone();
        pod.id = repository.register_pod(&sample_pod).unwrap();

        let result = service.update_pod(pod).await;
        assert!(matches!(result, Err(ControllerError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_cannot_rename(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, _) = service(db_connection, &cluster);
        let mut pod = service.create_pod(sample_pod).await.unwrap();

        pod.name = "web-2".to_string();
        let result = service.update_pod(pod).await;
        assert!(matches!(result, Err(ControllerError::Validation(_))));
        assert!(!cluster.contains("default", "web-2"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_divergence_flags_row(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        let mut pod = service.create_pod(sample_pod).await.unwrap();

        repository.fail_writes.store(true, Ordering::SeqCst);
        pod.replicas = 4;
        let result = service.update_pod(pod.clone()).await;
        assert!(matches!(
            result,
            Err(ControllerError::Divergence {
                operation: Crud::Update,
                ..
            })
        ));

        let live = cluster.get("default", "web-1").unwrap();
        assert_eq!(live.spec.unwrap().replicas, Some(4));
        let diverged = service.find_diverged_pods().unwrap();
        assert_eq!(diverged.len(), 1);
        assert_eq!(diverged[0].replicas, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_removes_both_sides(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, _) = service(db_connection, &cluster);
        let pod = service.create_pod(sample_pod).await.unwrap();

        let deleted = service.delete_pod(pod.id).await.unwrap();
        assert_eq!(deleted.name, "web-1");
        assert!(!cluster.contains("default", "web-1"));
        assert!(matches!(
            service.find_pod_by_id(pod.id),
            Err(ControllerError::NotFound(_))
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_rejected_when_workload_missing(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        let id = repository.register_pod(&sample_pod).unwrap();

        let result = service.delete_pod(id).await;
        assert!(matches!(result, Err(ControllerError::NotFound(_))));
        assert!(service.find_pod_by_id(id).is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_divergence_flags_row(db_connection: Arc<PodDataBase>, sample_pod: Pod) {
        let cluster = FakeCluster::default();
        let (service, repository) = service(db_connection, &cluster);
        let pod = service.create_pod(sample_pod).await.unwrap();

        repository.fail_writes.store(true, Ordering::SeqCst);
        let result = service.delete_pod(pod.id).await;
        assert!(matches!(
            result,
            Err(ControllerError::Divergence {
                operation: Crud::Delete,
                ..
            })
        ));
        assert!(!cluster.contains("default", "web-1"));
        assert_eq!(service.find_diverged_pods().unwrap()[0].id, pod.id);
    }

    #[rstest]
    #[tokio::test]
    async fn test_cluster_unavailable_is_surfaced(
        db_connection: Arc<PodDataBase>,
        sample_pod: Pod,
    ) {
        let cluster = FakeCluster::default();
        cluster.unavailable.store(true, Ordering::SeqCst);
        let (service, _) = service(db_connection, &cluster);

        let result = service.create_pod(sample_pod).await;
        assert!(matches!(
            result,
            Err(ControllerError::BackendUnavailable(_))
        ));
    }
}
