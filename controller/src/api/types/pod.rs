use crate::api::ControllerError;
use definition::pod::{
    Pod, PodEnv, PodPort, Protocol, PullPolicy, RestartPolicy, SyncStatus, ValidationError,
};
use serde::{Deserialize, Serialize};

fn default_namespace() -> String {
    String::from("default")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PodPortInfo {
    pub port: i32,
    #[serde(default)]
    pub protocol: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PodEnvInfo {
    pub env_key: String,
    #[serde(default)]
    pub env_value: String,
}

/// Pod declaration as exchanged with callers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PodInfo {
    #[serde(default)]
    pub pod_id: i64,
    pub pod_name: String,
    #[serde(default = "default_namespace")]
    pub pod_namespace: String,
    #[serde(default)]
    pub pod_team_id: i64,
    #[serde(default)]
    pub pod_min_cpu_usage: Option<f64>,
    #[serde(default)]
    pub pod_max_cpu_usage: Option<f64>,
    #[serde(default)]
    pub pod_min_mem_usage: Option<f64>,
    #[serde(default)]
    pub pod_max_mem_usage: Option<f64>,
    pub image: String,
    #[serde(default)]
    pub pod_pull_policy: String,
    #[serde(default)]
    pub pod_restart_policy: String,
    #[serde(default)]
    pub pod_deploy_type: String,
    #[serde(default)]
    pub replicas: i32,
    #[serde(default)]
    pub pod_ports: Vec<PodPortInfo>,
    #[serde(default)]
    pub pod_envs: Vec<PodEnvInfo>,
    /// Only filled on the way out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodId {
    pub id: i64,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AllPods {
    pub pod_info: Vec<PodInfo>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Response {
    pub msg: String,
}

impl Response {
    pub fn new(msg: impl Into<String>) -> Response {
        Response { msg: msg.into() }
    }
}

fn pull_policy_name(policy: PullPolicy) -> &'static str {
    match policy {
        PullPolicy::IfNotPresent => "if_not_present",
        PullPolicy::Always => "always",
        PullPolicy::Never => "never",
    }
}

fn restart_policy_name(policy: RestartPolicy) -> &'static str {
    match policy {
        RestartPolicy::Always => "always",
        RestartPolicy::OnFailure => "on_failure",
        RestartPolicy::Never => "never",
    }
}

impl TryFrom<PodInfo> for Pod {
    type Error = ControllerError;

    fn try_from(info: PodInfo) -> Result<Self, Self::Error> {
        let ports = info
            .pod_ports
            .iter()
            .map(|port| {
                u16::try_from(port.port)
                    .map(|number| PodPort {
                        port: number,
                        protocol: Protocol::from(port.protocol.as_str()),
                    })
                    .map_err(|_| ValidationError::InvalidPort)
            })
            .collect::<Result<Vec<PodPort>, ValidationError>>()?;
        let envs = info
            .pod_envs
            .into_iter()
            .map(|env| PodEnv {
                key: env.env_key,
                value: env.env_value,
            })
            .collect();

        Ok(Pod {
            id: info.pod_id,
            name: info.pod_name,
            namespace: info.pod_namespace,
            team_id: info.pod_team_id,
            min_cpu: info.pod_min_cpu_usage,
            max_cpu: info.pod_max_cpu_usage,
            min_memory: info.pod_min_mem_usage,
            max_memory: info.pod_max_mem_usage,
            image: info.image,
            pull_policy: PullPolicy::from(info.pod_pull_policy.as_str()),
            restart_policy: RestartPolicy::from(info.pod_restart_policy.as_str()),
            deploy_type: info.pod_deploy_type,
            replicas: info.replicas,
            ports,
            envs,
            sync_status: SyncStatus::Pending,
        })
    }
}

impl From<Pod> for PodInfo {
    fn from(pod: Pod) -> Self {
        PodInfo {
            pod_id: pod.id,
            pod_name: pod.name,
            pod_namespace: pod.namespace,
            pod_team_id: pod.team_id,
            pod_min_cpu_usage: pod.min_cpu,
            pod_max_cpu_usage: pod.max_cpu,
            pod_min_mem_usage: pod.min_memory,
            pod_max_mem_usage: pod.max_memory,
            image: pod.image,
            pod_pull_policy: pull_policy_name(pod.pull_policy).to_string(),
            pod_restart_policy: restart_policy_name(pod.restart_policy).to_string(),
            pod_deploy_type: pod.deploy_type,
            replicas: pod.replicas,
            pod_ports: pod
                .ports
                .into_iter()
                .map(|port| PodPortInfo {
                    port: i32::from(port.port),
                    protocol: port.protocol.to_string(),
                })
                .collect(),
            pod_envs: pod
                .envs
                .into_iter()
                .map(|env| PodEnvInfo {
                    env_key: env.key,
                    env_value: env.value,
                })
                .collect(),
            sync_status: Some(pod.sync_status.to_string()),
        }
    }
}
