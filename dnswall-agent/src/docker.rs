//! Container Source: enumerates running containers and inspects them for
//! the fields the Reconciler's projection rules need.

use std::collections::HashMap;

use bollard::container::ListContainersOptions;
use bollard::secret::ContainerInspectResponse;
use bollard::Docker;

use crate::cli::TlsConfig;

/// The subset of `docker inspect` the reconciler cares about, already
/// flattened out of bollard's nested response shape.
#[derive(Debug, Clone)]
pub struct RawContainer {
    pub id: String,
    pub env: HashMap<String, String>,
    pub tty: bool,
    /// network name -> (ipv4, ipv6)
    pub networks: HashMap<String, (Option<String>, Option<String>)>,
}

pub struct ContainerSource {
    docker: Docker,
}

impl ContainerSource {
    /// Connects to the docker daemon at `docker_url`, over TLS when `tls`
    /// is given.
    pub fn connect(docker_url: &str, tls: Option<&TlsConfig>) -> Result<Self, bollard::errors::Error> {
        let docker = match tls {
            Some(tls) => Docker::connect_with_ssl(
                docker_url,
                std::path::Path::new(&tls.key),
                std::path::Path::new(&tls.cert),
                std::path::Path::new(&tls.ca),
                120,
                bollard::API_DEFAULT_VERSION,
            )?,
            None => Docker::connect_with_local(docker_url, 120, bollard::API_DEFAULT_VERSION)?,
        };

        Ok(Self { docker })
    }

    /// Lists the ids of every currently-running container.
    pub async fn running_container_ids(&self) -> Result<Vec<String>, bollard::errors::Error> {
        let mut filters = HashMap::new();
        filters.insert("status", vec!["running"]);

        let options = ListContainersOptions {
            all: false,
            filters,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    /// Inspects one container and flattens the fields the reconciler needs.
    pub async fn inspect(&self, id: &str) -> Result<RawContainer, bollard::errors::Error> {
        let response = self.docker.inspect_container(id, None).await?;
        Ok(flatten(response))
    }
}

fn flatten(response: ContainerInspectResponse) -> RawContainer {
    let id = response.id.clone().unwrap_or_default();

    let env = response
        .config
        .as_ref()
        .and_then(|config| config.env.as_ref())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.split_once('='))
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let tty = response
        .config
        .as_ref()
        .and_then(|config| config.tty)
        .unwrap_or(false);

    let networks = response
        .network_settings
        .as_ref()
        .and_then(|settings| settings.networks.as_ref())
        .map(|networks| {
            networks
                .iter()
                .map(|(name, endpoint)| {
                    let ipv4 = endpoint.ip_address.clone().filter(|addr| !addr.is_empty());
                    let ipv6 = endpoint
                        .global_ipv6_address
                        .clone()
                        .filter(|addr| !addr.is_empty());
                    (name.clone(), (ipv4, ipv6))
                })
                .collect()
        })
        .unwrap_or_default();

    RawContainer {
        id,
        env,
        tty,
        networks,
    }
}
