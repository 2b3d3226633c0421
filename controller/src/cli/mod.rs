use crate::core::descriptor::ResourcePolicy;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Keeps pods declared once in sync between the cluster and the registry.
#[derive(Parser, Debug)]
#[command(name = "pod-controller", version, about)]
pub struct Cli {
    /// The level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Port the HTTP API listens on.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the registry database.
    #[arg(long, env = "DATABASE_LOCATION", default_value = "/var/lib/pod-controller/data/")]
    pub database_location: PathBuf,

    /// Registry database name, without extension.
    #[arg(long, env = "DATABASE_NAME", default_value = "pods")]
    pub database_name: String,

    /// How resource requests are derived from the pod bounds.
    #[arg(long, env = "RESOURCE_REQUESTS", value_enum, default_value_t = ResourcePolicy::Max)]
    pub resource_requests: ResourcePolicy,

    /// Number of threads serving HTTP requests.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,
}

impl Cli {
    pub fn get_log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pod-controller"]);
        assert_eq!(cli.resource_requests, ResourcePolicy::Max);
        assert_eq!(cli.workers, 4);
        assert_eq!(cli.get_log_level(), Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "pod-controller",
            "-vv",
            "--resource-requests",
            "min-requests",
            "--database-name",
            "registry",
        ]);
        assert_eq!(cli.resource_requests, ResourcePolicy::MinRequests);
        assert_eq!(cli.database_name, "registry");
        assert_eq!(cli.get_log_level(), Level::TRACE);
    }
}
