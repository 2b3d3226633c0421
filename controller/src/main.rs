mod api;
mod cli;
mod core;
mod database;
#[cfg(test)]
mod tests;

use crate::api::external;
use crate::api::handler::PodHandler;
use crate::cli::Cli;
use crate::core::cluster_gateway::KubeGateway;
use crate::core::descriptor::DescriptorBuilder;
use crate::core::pod_repository::PodRepositoryImpl;
use crate::core::pod_service::PodServiceImpl;
use crate::database::PodDataBase;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{event, Level};

fn logger_setup(level: Level) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logger_setup(cli.get_log_level())?;
    event!(Level::INFO, "Starting pod controller");

    let db = PodDataBase::new(cli.database_location.clone(), cli.database_name.clone());
    db.init_tables()?;

    let client = kube::Client::try_default().await?;
    let service = PodServiceImpl::new(
        KubeGateway::new(client),
        PodRepositoryImpl::new(db),
        DescriptorBuilder::new(cli.resource_requests),
    );
    event!(
        Level::INFO,
        "Resource requests derived with policy {:?}",
        cli.resource_requests
    );

    let handler = PodHandler::new(Arc::new(service), Handle::current());
    let server = external::Server::new(handler, cli.port, cli.workers);
    tokio::task::spawn_blocking(move || server.run()).await??;
    Ok(())
}
