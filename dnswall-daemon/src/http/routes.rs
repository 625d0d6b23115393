//! Read/write REST surface over the registry.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use dnswall_core::{DomainItem, Registry};

use super::error::AdminHttpError;

const DEFAULT_TTL_SECONDS: u64 = 60;

#[derive(Deserialize)]
pub struct NameQuery {
    name: Option<String>,
}

#[derive(Deserialize)]
pub struct WriteQuery {
    name: String,
    #[serde(default)]
    ttl: Option<u64>,
}

#[derive(Deserialize)]
struct ItemPayload {
    uuid: String,
    host_ipv4: Option<String>,
    host_ipv6: Option<String>,
}

pub async fn get_version() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// `GET /names?name=<fqdn>` returns one `DomainDetail`; `GET /names` with no
/// query returns every name currently registered.
pub async fn get_names(
    registry: web::Data<Arc<Registry>>,
    query: web::Query<NameQuery>,
) -> Result<HttpResponse, AdminHttpError> {
    match &query.name {
        Some(name) => {
            let detail = registry.lookup(name).await?;
            Ok(HttpResponse::Ok().json(detail_json(&detail)))
        }
        None => {
            let details = registry.lookall(None).await?;
            let payload: Vec<_> = details.iter().map(detail_json).collect();
            Ok(HttpResponse::Ok().json(payload))
        }
    }
}

/// `POST /names?name=<fqdn>[&ttl=<seconds>]` with a JSON array body of
/// `{uuid, host_ipv4, host_ipv6}` objects registers each as an item under
/// `name`.
pub async fn post_names(
    registry: web::Data<Arc<Registry>>,
    query: web::Query<WriteQuery>,
    body: web::Json<Vec<ItemPayload>>,
) -> Result<HttpResponse, AdminHttpError> {
    let ttl = query.ttl.unwrap_or(DEFAULT_TTL_SECONDS);

    for payload in body.into_inner() {
        let item = DomainItem::new(payload.uuid, payload.host_ipv4, payload.host_ipv6)
            .map_err(AdminHttpError::from)?;
        registry.register(&query.name, &item, ttl).await?;
    }

    Ok(HttpResponse::Created().finish())
}

/// `DELETE /names?name=<fqdn>` with a JSON array body of the same item
/// shape unregisters each item under `name`.
pub async fn delete_names(
    registry: web::Data<Arc<Registry>>,
    query: web::Query<WriteQuery>,
    body: web::Json<Vec<ItemPayload>>,
) -> Result<HttpResponse, AdminHttpError> {
    for payload in body.into_inner() {
        let item = DomainItem::new(payload.uuid, payload.host_ipv4, payload.host_ipv6)
            .map_err(AdminHttpError::from)?;
        registry.unregister(&query.name, &item).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}

fn detail_json(detail: &dnswall_core::DomainDetail) -> serde_json::Value {
    serde_json::json!({
        "name": detail.name,
        "items": detail.items,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/_version", web::get().to(get_version))
        .route("/names", web::get().to(get_names))
        .route("/names", web::post().to(post_names))
        .route("/names", web::delete().to(delete_names));
}
