//! The Registry: domain/key encoding, item CRUD, wildcard lookup and
//! aggregation over a [`Backend`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{Backend, KvError};
use crate::error::{Error, Result};
use crate::key;
use crate::model::{self, DomainDetail, DomainItem};

pub struct Registry {
    backend: Arc<dyn Backend>,
    base_path: String,
    patterns: Vec<String>,
}

impl Registry {
    pub fn new(backend: Arc<dyn Backend>, base_path: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            backend,
            base_path: base_path.into(),
            patterns,
        }
    }

    /// False if `name` fails syntax validation; otherwise true iff no
    /// patterns are configured or one of them is a suffix of `name`.
    pub fn supports(&self, name: &str) -> bool {
        if !model::is_valid_name(name) {
            return false;
        }

        self.patterns.is_empty()
            || self.patterns.iter().any(|pattern| name.ends_with(pattern.as_str()))
    }

    /// Registers `item` under every name in the `,`/`;`/`|`-delimited
    /// `names` argument. Best-effort: the first failure stops the sequence
    /// and already-written keys are left in place for the next heartbeat to
    /// re-converge.
    pub async fn register(&self, names: &str, item: &DomainItem, ttl_seconds: u64) -> Result<()> {
        for name in model::split_names(names) {
            self.register_one(&name, item, ttl_seconds).await?;
        }

        Ok(())
    }

    async fn register_one(&self, name: &str, item: &DomainItem, ttl_seconds: u64) -> Result<()> {
        if !self.supports(name) {
            return Err(Error::value(format!(
                "name '{name}' is syntactically invalid or not covered by any configured pattern"
            )));
        }

        let key = key::encode_item_key(&self.base_path, name, &item.uuid);
        let value = item.to_json()?;

        self.backend
            .set(&key, &value, Some(ttl_seconds))
            .await
            .map_err(Error::from)?;

        debug!(name, uuid = %item.uuid, ttl_seconds, "registered item");
        Ok(())
    }

    /// Deletes the per-uuid leaf key(s) for `item` under every name in
    /// `names`. A "not found" from the backend is silently ignored.
    pub async fn unregister(&self, names: &str, item: &DomainItem) -> Result<()> {
        for name in model::split_names(names) {
            let key = key::encode_item_key(&self.base_path, &name, &item.uuid);
            match self.backend.delete(&key).await {
                Ok(()) | Err(KvError::NotFound) => {}
                Err(KvError::Failure(reason)) => return Err(Error::backend(reason)),
            }
        }

        Ok(())
    }

    /// Resolves `name` to its deduplicated address set, falling back one
    /// level to the enclosing wildcard when the direct subtree is absent or
    /// decodes to zero items.
    pub async fn lookup(&self, name: &str) -> Result<DomainDetail> {
        if !self.supports(name) {
            return Ok(DomainDetail::empty(name));
        }

        self.lookup_inner(name, true).await
    }

    async fn lookup_inner(&self, name: &str, allow_fallback: bool) -> Result<DomainDetail> {
        let subtree = key::encode_name_subtree(&self.base_path, name);
        let leaves = self.read_subtree(&subtree).await?;

        let items: Vec<DomainItem> = leaves
            .iter()
            .filter(|leaf| {
                key::decode_name_from_key(&self.base_path, &leaf.key).as_deref() == Some(name)
            })
            .filter_map(|leaf| DomainItem::from_json(&leaf.value).ok())
            .collect();

        let detail = DomainDetail::from_items(name, items);

        if detail.is_empty() && allow_fallback {
            let labels: Vec<&str> = name.split('.').collect();
            if labels.len() >= 3 && !model::is_wildcard(name) {
                let wildcard_name = format!("*.{}", labels[1..].join("."));
                debug!(name, wildcard_name, "empty lookup, trying wildcard fallback");
                return self.lookup_inner(&wildcard_name, false).await;
            }
        }

        Ok(detail)
    }

    /// Recursively reads the subtree for `name` (or the whole registry when
    /// `name` is `None`) and re-aggregates it into one [`DomainDetail`] per
    /// distinct decoded name. Used by the HTTP admin surface and
    /// diagnostics only.
    pub async fn lookall(&self, name: Option<&str>) -> Result<Vec<DomainDetail>> {
        let prefix = match name {
            Some(name) => key::encode_name_subtree(&self.base_path, name),
            // Trailing separator so a KV prefix scan stays on a segment
            // boundary: base "/dnswall" must not also sweep in a sibling
            // deployment's "/dnswall-staging" keys.
            None => format!("/{}/", self.base_path.trim_matches('/')),
        };

        let leaves = self.read_subtree(&prefix).await?;

        let mut by_name: BTreeMap<String, Vec<DomainItem>> = BTreeMap::new();
        for leaf in leaves {
            let Some(decoded_name) = key::decode_name_from_key(&self.base_path, &leaf.key) else {
                continue;
            };
            let Ok(item) = DomainItem::from_json(&leaf.value) else {
                warn!(key = %leaf.key, "skipping leaf with malformed item json");
                continue;
            };
            by_name.entry(decoded_name).or_default().push(item);
        }

        Ok(by_name
            .into_iter()
            .map(|(name, items)| DomainDetail::from_items(name, items))
            .collect())
    }

    async fn read_subtree(&self, prefix: &str) -> Result<Vec<crate::backend::Leaf>> {
        match self.backend.read(prefix).await {
            Ok(leaves) => Ok(leaves),
            Err(KvError::NotFound) => Ok(Vec::new()),
            Err(KvError::Failure(reason)) => Err(Error::backend(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Leaf;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// An in-memory stand-in for an etcd-class store, keyed by full path,
    /// with no TTL expiry (tests assert registry logic, not backend
    /// lifecycle).
    #[derive(Default)]
    struct FakeBackend {
        entries: Mutex<BTreeMap<String, String>>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn set(&self, key: &str, value: &str, _ttl_seconds: Option<u64>) -> Result<(), KvError> {
            self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), KvError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn read(&self, key_prefix: &str) -> Result<Vec<Leaf>, KvError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(key, _)| key.starts_with(key_prefix))
                .map(|(key, value)| Leaf {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect())
        }
    }

    fn registry_with_patterns(patterns: Vec<String>) -> Registry {
        Registry::new(Arc::new(FakeBackend::default()), "/dnswall", patterns)
    }

    #[tokio::test]
    async fn register_then_lookup_round_trips() {
        let registry = registry_with_patterns(vec![]);
        let item = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        registry.register("api.svc.local", &item, 60).await.unwrap();

        let detail = registry.lookup("api.svc.local").await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].host_ipv4.as_deref(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn register_rejects_unsupported_pattern() {
        let registry = registry_with_patterns(vec!["svc.local".to_string()]);
        let item = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        let err = registry.register("api.other.tld", &item, 60).await.unwrap_err();
        assert!(matches!(err, Error::BackendValueError(_)));
    }

    #[tokio::test]
    async fn multi_name_register_writes_both_keys() {
        let registry = registry_with_patterns(vec![]);
        let item = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        registry.register("a.b.c,d.e.f", &item, 60).await.unwrap();

        assert_eq!(registry.lookup("a.b.c").await.unwrap().items.len(), 1);
        assert_eq!(registry.lookup("d.e.f").await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn two_containers_same_name_both_appear() {
        let registry = registry_with_patterns(vec![]);
        let a = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        let b = DomainItem::new("cid2", Some("10.0.0.6".to_string()), None).unwrap();
        registry.register("api.svc.local", &a, 60).await.unwrap();
        registry.register("api.svc.local", &b, 60).await.unwrap();

        let detail = registry.lookup("api.svc.local").await.unwrap();
        assert_eq!(detail.items.len(), 2);
    }

    #[tokio::test]
    async fn wildcard_fallback_triggers_at_three_labels_only() {
        let registry = registry_with_patterns(vec![]);
        let item = DomainItem::new("cid1", Some("10.0.0.9".to_string()), None).unwrap();
        registry
            .register("*.region.svc.local", &item, 60)
            .await
            .unwrap();

        let hit = registry.lookup("host.region.svc.local").await.unwrap();
        assert_eq!(hit.items.len(), 1);

        let two_label = registry.lookup("a.b").await.unwrap();
        assert!(two_label.is_empty());

        let wildcard_itself = registry.lookup("*.region.svc.local").await.unwrap();
        assert_eq!(wildcard_itself.items.len(), 1);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = registry_with_patterns(vec![]);
        let item = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        registry.register("api.svc.local", &item, 60).await.unwrap();
        registry.unregister("api.svc.local", &item).await.unwrap();
        registry.unregister("api.svc.local", &item).await.unwrap();

        assert!(registry.lookup("api.svc.local").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookall_groups_leaves_by_name() {
        let registry = registry_with_patterns(vec![]);
        let a = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        let b = DomainItem::new("cid2", Some("10.0.0.6".to_string()), None).unwrap();
        registry.register("a.b.c", &a, 60).await.unwrap();
        registry.register("d.e.f", &b, 60).await.unwrap();

        let mut details = registry.lookall(None).await.unwrap();
        details.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].name, "a.b.c");
        assert_eq!(details[1].name, "d.e.f");
    }

    #[tokio::test]
    async fn lookall_none_does_not_leak_a_sibling_base_path() {
        let backend = Arc::new(FakeBackend::default());
        let registry = Registry::new(Arc::clone(&backend) as Arc<dyn Backend>, "/dnswall", vec![]);

        let item = DomainItem::new("cid1", Some("10.0.0.5".to_string()), None).unwrap();
        registry.register("a.b.c", &item, 60).await.unwrap();

        // A sibling deployment sharing the same KV store under a base path
        // that is a string-prefix of ours ("/dnswall-staging") but not a
        // path-segment boundary must not show up in our `lookall(None)`.
        backend
            .set(
                "/dnswall-staging/local/svc/api/@items/cid2",
                &item.to_json().unwrap(),
                None,
            )
            .await
            .unwrap();

        let details = registry.lookall(None).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].name, "a.b.c");
    }

    #[tokio::test]
    async fn supports_reflects_syntax_and_patterns() {
        let registry = registry_with_patterns(vec!["svc.local".to_string()]);
        assert!(registry.supports("api.svc.local"));
        assert!(!registry.supports("api.other.tld"));
        assert!(!registry.supports("not a name"));
    }
}
