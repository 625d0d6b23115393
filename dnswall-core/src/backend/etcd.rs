//! The one concrete [`super::Backend`]: an adapter over `etcd-client`'s etcd
//! v3 API. `Client` is cheap to clone (it shares an underlying gRPC
//! channel), so each call clones it rather than taking an exclusive lock.

use async_trait::async_trait;
use etcd_client::{Client, GetOptions, PutOptions};

use super::{Backend, KvError, Leaf};

pub struct EtcdBackend {
    client: Client,
}

impl EtcdBackend {
    /// Connects to every endpoint; `etcd-client` load-balances across them
    /// and reconnects to any surviving member on its own.
    pub async fn connect(endpoints: &[String]) -> Result<Self, KvError> {
        let client = Client::connect(endpoints, None)
            .await
            .map_err(|err| KvError::Failure(err.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Backend for EtcdBackend {
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), KvError> {
        let mut client = self.client.clone();

        let lease_id = match ttl_seconds {
            Some(ttl) => {
                let lease = client
                    .lease_grant(ttl as i64, None)
                    .await
                    .map_err(|err| KvError::Failure(err.to_string()))?;
                Some(lease.id())
            }
            None => None,
        };

        let options = lease_id.map(|id| PutOptions::new().with_lease(id));

        client
            .put(key, value, options)
            .await
            .map_err(|err| KvError::Failure(err.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut client = self.client.clone();
        client
            .delete(key, None)
            .await
            .map_err(|err| KvError::Failure(err.to_string()))?;
        Ok(())
    }

    async fn read(&self, key_prefix: &str) -> Result<Vec<Leaf>, KvError> {
        let mut client = self.client.clone();
        let response = client
            .get(key_prefix, Some(GetOptions::new().with_prefix()))
            .await
            .map_err(|err| KvError::Failure(err.to_string()))?;

        let leaves = response
            .kvs()
            .iter()
            .map(|kv| Leaf {
                key: kv.key_str().unwrap_or_default().to_string(),
                value: kv.value_str().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(leaves)
    }
}
