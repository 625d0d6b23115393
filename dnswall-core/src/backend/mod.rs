//! The KV backend adapter: a single trait (per the design's single-variant
//! polymorphism note) plus one concrete implementation, [`etcd::EtcdBackend`].

pub mod etcd;

use async_trait::async_trait;

/// One leaf returned by a recursive [`Backend::read`].
#[derive(Debug, Clone)]
pub struct Leaf {
    pub key: String,
    pub value: String,
}

/// Internal backend failure. `NotFound` is swallowed by the registry before
/// it ever becomes a [`crate::error::Error`]; `Failure` always becomes
/// `Error::BackendError`.
#[derive(Debug)]
pub enum KvError {
    NotFound,
    Failure(String),
}

impl std::fmt::Display for KvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Failure(reason) => write!(f, "{reason}"),
        }
    }
}

/// Thin adapter over an ordered, hierarchical KV store (etcd-class).
///
/// One concrete implementation ships ([`etcd::EtcdBackend`]); the trait
/// exists so a future backend can be dropped in without touching the
/// registry.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Writes `value` at `key`, attaching a lease that expires after
    /// `ttl_seconds` when given.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), KvError>;

    /// Deletes `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Recursively reads every leaf under `key_prefix`. Returns an empty
    /// vector (not `NotFound`) when nothing exists under the prefix.
    async fn read(&self, key_prefix: &str) -> Result<Vec<Leaf>, KvError>;
}

/// A parsed `etcd://host1:port1[,host2:port2...]/base-path?pattern=<suffix>`
/// connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl {
    pub scheme: String,
    pub endpoints: Vec<String>,
    pub base_path: String,
    pub patterns: Vec<String>,
}

impl BackendUrl {
    /// Parses a connection string, without attempting to connect.
    ///
    /// Returns [`crate::error::Error::MalformedConfig`] for anything that
    /// isn't shaped like `scheme://host[,host...][/path][?pattern=...]`.
    pub fn parse(url: &str) -> crate::error::Result<Self> {
        let (scheme, rest) = url.split_once("://").ok_or_else(|| {
            crate::error::Error::MalformedConfig(format!("backend url missing scheme: {url}"))
        })?;

        if scheme.is_empty() {
            return Err(crate::error::Error::MalformedConfig(
                "backend url has an empty scheme".to_string(),
            ));
        }

        let (authority_and_path, query) = match rest.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (rest, None),
        };

        let (authority, path) = match authority_and_path.split_once('/') {
            Some((authority, path)) => (authority, format!("/{path}")),
            None => (authority_and_path, "/dnswall".to_string()),
        };

        if authority.is_empty() {
            return Err(crate::error::Error::MalformedConfig(
                "backend url has no host".to_string(),
            ));
        }

        let endpoints: Vec<String> = authority.split(',').map(str::to_string).collect();

        let patterns = query
            .map(|query| {
                query
                    .split('&')
                    .filter_map(|pair| pair.strip_prefix("pattern="))
                    .filter(|suffix| !suffix.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            scheme: scheme.to_string(),
            endpoints,
            base_path: path,
            patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_host_with_defaults() {
        let parsed = BackendUrl::parse("etcd://kv:2379").unwrap();
        assert_eq!(parsed.scheme, "etcd");
        assert_eq!(parsed.endpoints, vec!["kv:2379".to_string()]);
        assert_eq!(parsed.base_path, "/dnswall");
        assert!(parsed.patterns.is_empty());
    }

    #[test]
    fn parses_multi_host_base_path_and_patterns() {
        let parsed =
            BackendUrl::parse("etcd://a:2379,b:2379/dnswall?pattern=svc.local&pattern=int.local")
                .unwrap();
        assert_eq!(parsed.endpoints, vec!["a:2379".to_string(), "b:2379".to_string()]);
        assert_eq!(parsed.base_path, "/dnswall");
        assert_eq!(
            parsed.patterns,
            vec!["svc.local".to_string(), "int.local".to_string()]
        );
    }

    #[test]
    fn rejects_url_without_scheme() {
        assert!(BackendUrl::parse("kv:2379/dnswall").is_err());
    }

    #[test]
    fn rejects_url_without_host() {
        assert!(BackendUrl::parse("etcd:///dnswall").is_err());
    }
}
