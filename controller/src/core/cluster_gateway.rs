use crate::api::ControllerError;
use crate::core::ClusterGateway;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use tracing::{event, Level};

pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub fn new(client: Client) -> KubeGateway {
        KubeGateway { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Namespace and name a deployment is addressed with
fn identity(descriptor: &Deployment) -> Result<(&str, &str), ControllerError> {
    match (
        descriptor.metadata.namespace.as_deref(),
        descriptor.metadata.name.as_deref(),
    ) {
        (Some(namespace), Some(name)) => Ok((namespace, name)),
        _ => Err(ControllerError::Validation(
            "workload descriptor has no namespace or name".to_string(),
        )),
    }
}

fn map_kube_error(error: kube::Error, namespace: &str, name: &str) -> ControllerError {
    match error {
        kube::Error::Api(response) if response.code == 404 => {
            ControllerError::NotFound(format!("{}/{}", namespace, name))
        }
        kube::Error::Api(response) if response.code == 409 => {
            ControllerError::AlreadyExists(format!("{}/{}", namespace, name))
        }
        kube::Error::Api(response) => ControllerError::BackendRejected(format!(
            "{} ({}, {})",
            response.message, response.reason, response.code
        )),
        other => ControllerError::BackendUnavailable(other.to_string()),
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool, ControllerError> {
        self.deployments(namespace)
            .get_opt(name)
            .await
            .map(|deployment| deployment.is_some())
            .map_err(|e| map_kube_error(e, namespace, name))
    }

    async fn create(&self, descriptor: &Deployment) -> Result<(), ControllerError> {
        let (namespace, name) = identity(descriptor)?;
        event!(Level::DEBUG, "Creating deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .create(&PostParams::default(), descriptor)
            .await
            .map_err(|e| map_kube_error(e, namespace, name))?;
        Ok(())
    }

    async fn update(&self, descriptor: &Deployment) -> Result<(), ControllerError> {
        let (namespace, name) = identity(descriptor)?;
        event!(Level::DEBUG, "Replacing deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .replace(name, &PostParams::default(), descriptor)
            .await
            .map_err(|e| map_kube_error(e, namespace, name))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), ControllerError> {
        event!(Level::DEBUG, "Deleting deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| map_kube_error(e, namespace, name))?;
        Ok(())
    }
}
