pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use dnswall_core::Registry;

/// Runs the admin HTTP server until the process is terminated. Every
/// request passes through `tracing-actix-web`'s logger so method, path,
/// status and latency land in the same structured log stream as the rest
/// of the daemon.
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>) -> std::io::Result<()> {
    tracing::info!(%addr, "starting HTTP admin server");

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(web::Data::new(Arc::clone(&registry)))
            .configure(routes::configure)
    })
    .bind(addr)?
    .run()
    .await
}
