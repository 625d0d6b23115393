//! The data model: [`DomainItem`], [`DomainDetail`], and name-syntax
//! validation shared by the registry, the DNS front-end and the admin HTTP
//! surface.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// One address binding for one container under one name.
///
/// Equality and hashing are defined over `(host_ipv4, host_ipv6)` only — two
/// items with identical addresses but different `uuid` compare equal, which
/// is what lets [`DomainDetail`] dedup answer sets by address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainItem {
    pub uuid: String,
    pub host_ipv4: Option<String>,
    pub host_ipv6: Option<String>,
}

impl DomainItem {
    /// Builds an item, rejecting it if neither address is present.
    pub fn new(
        uuid: impl Into<String>,
        host_ipv4: Option<String>,
        host_ipv6: Option<String>,
    ) -> Result<Self> {
        if host_ipv4.is_none() && host_ipv6.is_none() {
            return Err(Error::value(
                "item has neither an IPv4 nor an IPv6 address",
            ));
        }

        Ok(Self {
            uuid: uuid.into(),
            host_ipv4,
            host_ipv6,
        })
    }

    /// Serializes to the on-wire value format: a JSON object with sorted
    /// keys, produced by routing through `serde_json::Value` (its `Map` is
    /// `BTreeMap`-backed) rather than serializing the struct directly.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_value(self)?.to_string())
    }

    pub fn from_json(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

impl PartialEq for DomainItem {
    fn eq(&self, other: &Self) -> bool {
        self.host_ipv4 == other.host_ipv4 && self.host_ipv6 == other.host_ipv6
    }
}

impl Eq for DomainItem {}

impl std::hash::Hash for DomainItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.host_ipv4.hash(state);
        self.host_ipv6.hash(state);
    }
}

/// The resolved, deduplicated address set for one name.
#[derive(Debug, Clone)]
pub struct DomainDetail {
    pub name: String,
    pub items: Vec<DomainItem>,
}

impl DomainDetail {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Builds a detail from a raw item list, deduping by address pair.
    pub fn from_items(name: impl Into<String>, items: Vec<DomainItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert((item.host_ipv4.clone(), item.host_ipv6.clone())))
            .collect();

        Self {
            name: name.into(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_valid_tld(tld: &str) -> bool {
    (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// A bare FQDN: `label(.label)+.tld`. Does not accept the `*.` wildcard
/// prefix — callers strip it first via [`is_valid_name`].
fn is_valid_fqdn(name: &str) -> bool {
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let (tld, rest) = labels.split_last().expect("checked len >= 2");
    is_valid_tld(tld) && rest.iter().all(|label| is_valid_label(label))
}

/// A name is valid iff it is a bare FQDN or a `*.` wildcard over one.
pub fn is_valid_name(name: &str) -> bool {
    match name.strip_prefix("*.") {
        Some(rest) => is_valid_fqdn(rest),
        None => is_valid_fqdn(name),
    }
}

pub fn is_wildcard(name: &str) -> bool {
    name.starts_with("*.")
}

/// Splits a `register`/`unregister` name argument on `,`, `;` or `|`,
/// trimming whitespace and dropping empty elements.
pub fn split_names(names: &str) -> Vec<String> {
    names
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_fqdn() {
        assert!(is_valid_name("api.svc.local"));
        assert!(is_valid_name("a.io"));
    }

    #[test]
    fn accepts_wildcard() {
        assert!(is_valid_name("*.svc.local"));
    }

    #[test]
    fn rejects_bad_labels() {
        assert!(!is_valid_name("-bad.svc.local"));
        assert!(!is_valid_name("bad-.svc.local"));
        assert!(!is_valid_name("has space.svc.local"));
    }

    #[test]
    fn rejects_bad_tld() {
        assert!(!is_valid_name("api.svc.l"));
        assert!(!is_valid_name("api.svc.toolongtld"));
        assert!(!is_valid_name("api.svc.1ab"));
    }

    #[test]
    fn rejects_single_label() {
        assert!(!is_valid_name("localhost"));
    }

    #[test]
    fn splits_on_any_delimiter() {
        assert_eq!(
            split_names("a.b.c, d.e.f;g.h.i|j.k.l"),
            vec!["a.b.c", "d.e.f", "g.h.i", "j.k.l"]
        );
    }

    #[test]
    fn item_requires_an_address() {
        assert!(DomainItem::new("u1", None, None).is_err());
        assert!(DomainItem::new("u1", Some("10.0.0.1".to_string()), None).is_ok());
    }

    #[test]
    fn detail_dedups_by_address_pair() {
        let a = DomainItem::new("u1", Some("10.0.0.1".to_string()), None).unwrap();
        let b = DomainItem::new("u2", Some("10.0.0.1".to_string()), None).unwrap();
        let detail = DomainDetail::from_items("api.svc.local", vec![a, b]);
        assert_eq!(detail.items.len(), 1);
    }
}
