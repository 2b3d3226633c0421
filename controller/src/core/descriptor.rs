use definition::pod::Pod;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// How resource requests are derived from the pod bounds. Limits always use the maximums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResourcePolicy {
    /// Requests equal limits, both taken from the maximums
    #[default]
    Max,
    /// Requests taken from the minimums when present, falling back to the maximums
    MinRequests,
}

/// Turns a pod into the deployment submitted to the cluster.
/// Holds no state besides its policy, so a build can be repeated on every retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorBuilder {
    resource_policy: ResourcePolicy,
}

impl DescriptorBuilder {
    pub fn new(resource_policy: ResourcePolicy) -> Self {
        Self { resource_policy }
    }

    pub fn build(&self, pod: &Pod) -> Deployment {
        let labels = BTreeMap::from([("app".to_string(), pod.name.clone())]);

        Deployment {
            metadata: ObjectMeta {
                name: Some(pod.name.clone()),
                namespace: Some(pod.namespace.clone()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(pod.replicas),
                selector: LabelSelector {
                    match_labels: Some(labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        name: Some(pod.name.clone()),
                        namespace: Some(pod.namespace.clone()),
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![self.container(pod)],
                        restart_policy: Some(pod.restart_policy.to_string()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn container(&self, pod: &Pod) -> Container {
        let ports: Vec<ContainerPort> = pod
            .ports
            .iter()
            .map(|port| ContainerPort {
                container_port: i32::from(port.port),
                protocol: Some(port.protocol.to_string()),
                ..Default::default()
            })
            .collect();
        let env: Vec<EnvVar> = pod
            .envs
            .iter()
            .map(|env| EnvVar {
                name: env.key.clone(),
                value: Some(env.value.clone()),
                ..Default::default()
            })
            .collect();

        Container {
            name: pod.name.clone(),
            image: Some(pod.image.clone()),
            image_pull_policy: Some(pod.pull_policy.to_string()),
            ports: (!ports.is_empty()).then_some(ports),
            env: (!env.is_empty()).then_some(env),
            resources: Some(self.resources(pod)),
            ..Default::default()
        }
    }

    fn resources(&self, pod: &Pod) -> ResourceRequirements {
        let (request_cpu, request_memory) = match self.resource_policy {
            ResourcePolicy::Max => (pod.max_cpu, pod.max_memory),
            ResourcePolicy::MinRequests => (
                pod.min_cpu.or(pod.max_cpu),
                pod.min_memory.or(pod.max_memory),
            ),
        };

        ResourceRequirements {
            limits: resource_list(pod.max_cpu, pod.max_memory),
            requests: resource_list(request_cpu, request_memory),
            ..Default::default()
        }
    }
}

/// Fixed point rendering with 6 digits, so no float artifact reaches the cluster
pub fn quantity(value: f64) -> Quantity {
    Quantity(format!("{:.6}", value))
}

fn resource_list(cpu: Option<f64>, memory: Option<f64>) -> Option<BTreeMap<String, Quantity>> {
    let mut list = BTreeMap::new();
    if let Some(cpu) = cpu {
        list.insert("cpu".to_string(), quantity(cpu));
    }
    if let Some(memory) = memory {
        list.insert("memory".to_string(), quantity(memory));
    }
    (!list.is_empty()).then_some(list)
}
