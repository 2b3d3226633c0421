pub mod pod {
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;
    use std::fmt::Display;
    use thiserror::Error;

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Protocol {
        #[default]
        TCP,
        UDP,
        SCTP,
    }

    /// Anything outside of the three protocols known by the cluster falls back to TCP
    impl From<&str> for Protocol {
        fn from(protocol: &str) -> Self {
            match protocol {
                "UDP" => Protocol::UDP,
                "SCTP" => Protocol::SCTP,
                _ => Protocol::TCP,
            }
        }
    }

    impl Display for Protocol {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Protocol::TCP => write!(f, "TCP"),
                Protocol::UDP => write!(f, "UDP"),
                Protocol::SCTP => write!(f, "SCTP"),
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum PullPolicy {
        #[default]
        IfNotPresent,
        Always,
        Never,
    }

    impl From<&str> for PullPolicy {
        fn from(policy: &str) -> Self {
            match policy {
                "always" | "Always" => PullPolicy::Always,
                "never" | "Never" => PullPolicy::Never,
                _ => PullPolicy::IfNotPresent,
            }
        }
    }

    impl Display for PullPolicy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                PullPolicy::IfNotPresent => write!(f, "IfNotPresent"),
                PullPolicy::Always => write!(f, "Always"),
                PullPolicy::Never => write!(f, "Never"),
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum RestartPolicy {
        #[default]
        Always,
        OnFailure,
        Never,
    }

    impl From<&str> for RestartPolicy {
        fn from(policy: &str) -> Self {
            match policy {
                "on_failure" | "on-failure" | "OnFailure" => RestartPolicy::OnFailure,
                "never" | "Never" => RestartPolicy::Never,
                _ => RestartPolicy::Always,
            }
        }
    }

    impl Display for RestartPolicy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                RestartPolicy::Always => write!(f, "Always"),
                RestartPolicy::OnFailure => write!(f, "OnFailure"),
                RestartPolicy::Never => write!(f, "Never"),
            }
        }
    }

    /// Where a pod stands between the cluster and the registry.
    /// A `Diverged` row had its cluster side mutated without the registry following.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum SyncStatus {
        Pending,
        #[default]
        Confirmed,
        Diverged,
    }

    impl From<&str> for SyncStatus {
        fn from(status: &str) -> Self {
            match status {
                "pending" => SyncStatus::Pending,
                "diverged" => SyncStatus::Diverged,
                _ => SyncStatus::Confirmed,
            }
        }
    }

    impl Display for SyncStatus {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                SyncStatus::Pending => write!(f, "pending"),
                SyncStatus::Confirmed => write!(f, "confirmed"),
                SyncStatus::Diverged => write!(f, "diverged"),
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct PodPort {
        pub port: u16,
        #[serde(default)]
        pub protocol: Protocol,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct PodEnv {
        pub key: String,
        pub value: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Pod {
        /// Registry identifier, `0` until the pod has been stored
        pub id: i64,
        /// Unique name, also used as the workload name in the cluster
        pub name: String,
        pub namespace: String,
        pub team_id: i64,
        pub min_cpu: Option<f64>,
        pub max_cpu: Option<f64>,
        pub min_memory: Option<f64>,
        pub max_memory: Option<f64>,
        pub image: String,
        pub pull_policy: PullPolicy,
        pub restart_policy: RestartPolicy,
        pub deploy_type: String,
        pub replicas: i32,
        #[serde(default)]
        pub ports: Vec<PodPort>,
        #[serde(default)]
        pub envs: Vec<PodEnv>,
        #[serde(default)]
        pub sync_status: SyncStatus,
    }

    #[derive(Debug, Error, PartialEq)]
    pub enum ValidationError {
        #[error("{0} must not be empty")]
        Empty(&'static str),
        #[error("replicas must not be negative, got {0}")]
        NegativeReplicas(i32),
        #[error("port must be between 1 and 65535")]
        InvalidPort,
        #[error("env key must not be empty")]
        EmptyEnvKey,
        #[error("env key {0} is declared more than once")]
        DuplicateEnvKey(String),
        #[error("minimum {resource} ({min}) exceeds maximum ({max})")]
        InvertedBounds {
            resource: &'static str,
            min: f64,
            max: f64,
        },
    }

    impl Pod {
        pub fn get_full_name(&self) -> String {
            format!("{}/{}", self.namespace, self.name)
        }

        pub fn validate(&self) -> Result<(), ValidationError> {
            if self.name.is_empty() {
                return Err(ValidationError::Empty("name"));
            }
            if self.namespace.is_empty() {
                return Err(ValidationError::Empty("namespace"));
            }
            if self.image.is_empty() {
                return Err(ValidationError::Empty("image"));
            }
            if self.replicas < 0 {
                return Err(ValidationError::NegativeReplicas(self.replicas));
            }
            if self.ports.iter().any(|p| p.port == 0) {
                return Err(ValidationError::InvalidPort);
            }

            let mut keys = HashSet::new();
            for env in &self.envs {
                if env.key.is_empty() {
                    return Err(ValidationError::EmptyEnvKey);
                }
                if !keys.insert(env.key.as_str()) {
                    return Err(ValidationError::DuplicateEnvKey(env.key.clone()));
                }
            }

            check_bounds("cpu", self.min_cpu, self.max_cpu)?;
            check_bounds("memory", self.min_memory, self.max_memory)
        }
    }

    fn check_bounds(
        resource: &'static str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<(), ValidationError> {
        match (min, max) {
            (Some(min), Some(max)) if min > max => {
                Err(ValidationError::InvertedBounds { resource, min, max })
            }
            _ => Ok(()),
        }
    }

}
