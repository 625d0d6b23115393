//! dnswall daemon binary entrypoint.
//!
//! Parses CLI flags, connects the KV backend, and runs the DNS front-end
//! (UDP+TCP) and the HTTP admin surface as independent long-lived tasks.
//! The first one to exit (or error) ends the process.

mod cli;
mod dns;
mod http;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hickory_server::server::ServerFuture;
use tokio::net::{TcpListener, UdpSocket};

use dnswall_core::backend::{etcd::EtcdBackend, BackendUrl};
use dnswall_core::{Error, Registry};

const TCP_TIMEOUT: Duration = Duration::from_secs(10);

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    if let Err(err) = run().await {
        tracing::error!(%err, "fatal startup error");
        std::process::exit(1);
    }

    Ok(())
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

    let patterns = if config.patterns.is_empty() {
        backend_url.patterns.clone()
    } else {
        config.patterns.clone()
    };

    let registry = Arc::new(Registry::new(Arc::new(backend), backend_url.base_path.clone(), patterns));
    let forwarder = Arc::new(dns::Forwarder::new(&config.nameservers));

    let dns_task = tokio::spawn(run_dns_server(config.dns_addr, Arc::clone(&registry), forwarder));
    let http_task = tokio::spawn(http::serve(config.http_addr, Arc::clone(&registry)));

    tokio::select! {
        result = dns_task => {
            log_join_result("dns front-end", result);
        }
        result = http_task => {
            log_join_result("http admin", result);
        }
    }

    Ok(())
}

fn log_join_result(label: &str, result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::warn!(label, "task exited"),
        Ok(Err(err)) => tracing::error!(label, %err, "task failed"),
        Err(err) => tracing::error!(label, %err, "task panicked"),
    }
}

async fn run_dns_server(
    addr: std::net::SocketAddr,
    registry: Arc<Registry>,
    forwarder: Arc<dns::Forwarder>,
) -> std::io::Result<()> {
    tracing::info!(%addr, "starting DNS front-end");

    let handler = dns::DnsHandler::new(registry, forwarder);
    let mut server = ServerFuture::new(handler);

    server.register_socket(UdpSocket::bind(addr).await?);
    server.register_listener(TcpListener::bind(addr).await?, TCP_TIMEOUT);

    server.block_until_done().await
}
