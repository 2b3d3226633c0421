use crate::api::types::pod::{AllPods, PodId, PodInfo, Response};
use crate::api::ControllerError;
use crate::core::PodService;
use definition::pod::Pod;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{event, Level};

/// Entry point for inbound requests: converts wire payloads to pods and back,
/// and runs the service on the async runtime.
/// Must be called from threads outside of the runtime.
pub struct PodHandler {
    service: Arc<dyn PodService>,
    runtime: Handle,
}

impl PodHandler {
    pub fn new(service: Arc<dyn PodService>, runtime: Handle) -> PodHandler {
        PodHandler { service, runtime }
    }

    pub fn add_pod(&self, info: PodInfo) -> Result<PodInfo, ControllerError> {
        event!(Level::INFO, "Add pod {}", info.pod_name);
        let pod = Pod::try_from(info)?;
        let created = self.runtime.block_on(self.service.create_pod(pod))?;
        Ok(created.into())
    }

    pub fn update_pod(&self, info: PodInfo) -> Result<PodInfo, ControllerError> {
        event!(Level::INFO, "Update pod {}", info.pod_name);
        let pod = Pod::try_from(info)?;
        let updated = self.runtime.block_on(self.service.update_pod(pod))?;
        Ok(updated.into())
    }

    pub fn delete_pod(&self, id: PodId) -> Result<Response, ControllerError> {
        event!(Level::INFO, "Delete pod {}", id.id);
        let deleted = self.runtime.block_on(self.service.delete_pod(id.id))?;
        Ok(Response::new(format!(
            "success delete pod, pod name {}",
            deleted.name
        )))
    }

    pub fn find_pod_by_id(&self, id: PodId) -> Result<PodInfo, ControllerError> {
        Ok(self.service.find_pod_by_id(id.id)?.into())
    }

    pub fn find_all_pods(&self) -> Result<AllPods, ControllerError> {
        let pods = self.service.find_all_pods()?;
        Ok(AllPods {
            pod_info: pods.into_iter().map(PodInfo::from).collect(),
        })
    }

    pub fn find_diverged_pods(&self) -> Result<AllPods, ControllerError> {
        let pods = self.service.find_diverged_pods()?;
        Ok(AllPods {
            pod_info: pods.into_iter().map(PodInfo::from).collect(),
        })
    }
}
