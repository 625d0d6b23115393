//! dnswall agent binary entrypoint.
//!
//! Connects to the docker daemon and the KV backend, runs one reconcile
//! pass immediately, then repeats every 30 seconds under a [`Supervisor`]
//! that backs off on failure instead of exiting.

mod cli;
mod docker;
mod reconcile;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use dnswall_core::backend::{etcd::EtcdBackend, BackendUrl};
use dnswall_core::{Error, Registry, Supervisor};

use docker::ContainerSource;
use reconcile::Reconciler;

const RECONCILE_INTERVAL: Duration = Duration::from_secs(30);

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(err) = run().await {
        tracing::error!(%err, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> dnswall_core::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.resolve()?;

    let backend_url = BackendUrl::parse(&config.backend_url)?;
    if backend_url.scheme != "etcd" {
        return Err(Error::BackendNotFound(backend_url.scheme.clone()));
    }

    let backend = EtcdBackend::connect(&backend_url.endpoints)
        .await
        .map_err(Error::from)?;

    let registry = Arc::new(Registry::new(
        Arc::new(backend),
        backend_url.base_path.clone(),
        backend_url.patterns.clone(),
    ));

    let source = ContainerSource::connect(&config.docker_url, config.tls.as_ref())
        .map_err(|err| Error::MalformedConfig(format!("cannot connect to docker daemon: {err}")))?;

    let reconciler = Reconciler::new(source, registry);
    let supervisor = Supervisor::default();

    supervisor
        .run("reconcile", || async {
            reconciler.heartbeat_all().await?;
            tokio::time::sleep(RECONCILE_INTERVAL).await;
            Ok::<(), dnswall_core::Error>(())
        })
        .await
}
