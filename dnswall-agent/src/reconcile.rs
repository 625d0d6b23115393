//! Projects container state into registry heartbeats.
//!
//! One `heartbeat_all` pass enumerates every running container, applies the
//! projection rules from `docker::RawContainer` to a `DomainItem`, and
//! registers it. Per-container value errors (bad name, no usable address)
//! are logged and skipped; KV backend failures propagate so the caller's
//! supervisor can back off and retry the whole pass.

use std::sync::Arc;

use tracing::{debug, info, warn};

use dnswall_core::{DomainItem, Error, Registry, Result};

use crate::docker::{ContainerSource, RawContainer};

const HEARTBEAT_TTL_SECONDS: u64 = 60;

pub struct Reconciler {
    source: ContainerSource,
    registry: Arc<Registry>,
}

impl Reconciler {
    pub fn new(source: ContainerSource, registry: Arc<Registry>) -> Self {
        Self { source, registry }
    }

    /// Enumerates running containers and heartbeats every one with a valid
    /// projection. Returns once the pass is complete.
    pub async fn heartbeat_all(&self) -> Result<()> {
        let ids = self
            .source
            .running_container_ids()
            .await
            .map_err(|err| Error::backend(err.to_string()))?;

        let mut registered = 0u32;
        for id in ids {
            match self.heartbeat_one(&id).await {
                Ok(true) => registered += 1,
                Ok(false) => {}
                Err(err) if err.is_value_error() => {
                    debug!(container_id = %id, %err, "skipping container");
                }
                Err(err) => return Err(err),
            }
        }

        info!(containers_seen = registered, "reconcile pass complete");
        Ok(())
    }

    async fn heartbeat_one(&self, id: &str) -> Result<bool> {
        let container = self
            .source
            .inspect(id)
            .await
            .map_err(|err| Error::backend(err.to_string()))?;

        if container.tty {
            return Ok(false);
        }

        let Some(domain_name) = container.env.get("DOMAIN_NAME") else {
            return Ok(false);
        };

        let (host_ipv4, host_ipv6) = resolve_addresses(&container);
        if host_ipv4.is_none() && host_ipv6.is_none() {
            warn!(container_id = %id, domain_name, "no resolvable address, skipping");
            return Ok(false);
        }

        let item = DomainItem::new(container.id.clone(), host_ipv4, host_ipv6)?;
        self.registry.register(domain_name, &item, HEARTBEAT_TTL_SECONDS).await?;
        Ok(true)
    }
}

/// `DOMAIN_NETWORK` takes priority: addresses come from that network's
/// endpoint settings. Otherwise falls back to the explicit
/// `DOMAIN_IPV4_ADDR`/`DOMAIN_IPV6_ADDR` overrides.
fn resolve_addresses(container: &RawContainer) -> (Option<String>, Option<String>) {
    if let Some(network) = container.env.get("DOMAIN_NETWORK") {
        return container
            .networks
            .get(network)
            .cloned()
            .unwrap_or((None, None));
    }

    (
        container.env.get("DOMAIN_IPV4_ADDR").cloned(),
        container.env.get("DOMAIN_IPV6_ADDR").cloned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn network_override_takes_priority_over_explicit_addrs() {
        let mut env = HashMap::new();
        env.insert("DOMAIN_NETWORK".to_string(), "web".to_string());
        env.insert("DOMAIN_IPV4_ADDR".to_string(), "1.1.1.1".to_string());

        let mut networks = HashMap::new();
        networks.insert(
            "web".to_string(),
            (Some("10.0.0.5".to_string()), None),
        );

        let container = RawContainer {
            id: "cid".to_string(),
            env,
            tty: false,
            networks,
        };

        assert_eq!(
            resolve_addresses(&container),
            (Some("10.0.0.5".to_string()), None)
        );
    }

    #[test]
    fn falls_back_to_explicit_addrs_without_network() {
        let mut env = HashMap::new();
        env.insert("DOMAIN_IPV4_ADDR".to_string(), "1.1.1.1".to_string());

        let container = RawContainer {
            id: "cid".to_string(),
            env,
            tty: false,
            networks: HashMap::new(),
        };

        assert_eq!(
            resolve_addresses(&container),
            (Some("1.1.1.1".to_string()), None)
        );
    }

    #[test]
    fn unknown_network_yields_no_address() {
        let mut env = HashMap::new();
        env.insert("DOMAIN_NETWORK".to_string(), "missing".to_string());

        let container = RawContainer {
            id: "cid".to_string(),
            env,
            tty: false,
            networks: HashMap::new(),
        };

        assert_eq!(resolve_addresses(&container), (None, None));
    }
}
