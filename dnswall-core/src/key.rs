//! KV key encoding and decoding.
//!
//! A name `a.b.c` with base path `P` and container uuid `u` is stored at
//! `<P>/c/b/a/@items/<u>`: labels reversed into DNS-hierarchical order, the
//! literal `@items` marker separating the name subtree from its per-item
//! leaves, and `*` swapped for the KV-safe literal `__wildcard__`.

const ITEMS_MARKER: &str = "@items";
const WILDCARD_LABEL: &str = "*";
const WILDCARD_ESCAPED: &str = "__wildcard__";

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn escape_label(label: &str) -> String {
    if label == WILDCARD_LABEL {
        WILDCARD_ESCAPED.to_string()
    } else {
        label.to_string()
    }
}

fn unescape_label(label: &str) -> String {
    if label == WILDCARD_ESCAPED {
        WILDCARD_LABEL.to_string()
    } else {
        label.to_string()
    }
}

fn reversed_path_segments(name: &str) -> Vec<String> {
    name.split('.').rev().map(escape_label).collect()
}

/// The subtree under which every item for `name` lives, with no trailing
/// uuid leaf: `<base>/<reversed-labels>/@items`.
pub fn encode_name_subtree(base: &str, name: &str) -> String {
    let base = normalize_base(base);
    let segments = reversed_path_segments(name);
    let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 2);
    if !base.is_empty() {
        parts.push(&base);
    }
    let segment_refs: Vec<&str> = segments.iter().map(String::as_str).collect();
    parts.extend(segment_refs.iter());
    parts.push(ITEMS_MARKER);
    format!("/{}", parts.join("/"))
}

/// The leaf key for one container's item under `name`.
pub fn encode_item_key(base: &str, name: &str, uuid: &str) -> String {
    format!("{}/{}", encode_name_subtree(base, name), uuid)
}

/// Recovers the name a leaf key was written under, given the registry's base
/// path. Returns `None` if `key` doesn't look like one of our leaves (no
/// `@items` marker, or it lies outside `base`).
pub fn decode_name_from_key(base: &str, key: &str) -> Option<String> {
    let base = normalize_base(base);
    let trimmed = key.trim_matches('/');

    let without_base = if base.is_empty() {
        trimmed
    } else {
        let with_separator = format!("{base}/");
        if trimmed == base {
            ""
        } else if let Some(rest) = trimmed.strip_prefix(&with_separator) {
            rest
        } else {
            return None;
        }
    };

    let segments: Vec<&str> = without_base.split('/').filter(|s| !s.is_empty()).collect();
    let marker_pos = segments.iter().position(|s| *s == ITEMS_MARKER)?;
    let name_segments = &segments[..marker_pos];
    if name_segments.is_empty() {
        return None;
    }

    let labels: Vec<String> = name_segments
        .iter()
        .rev()
        .map(|s| unescape_label(s))
        .collect();

    Some(labels.join("."))
}
