//! Deterministic reconciliation of partial payloads.
//!
//! Payloads are folded left to right in the fixed declaration order of the
//! fetchers that produced them. Mappings merge key by key, sequences
//! concatenate, and scalars follow last-non-null-wins. Nothing present in
//! exactly one input is ever dropped.

use crate::error::{Result, SignalError};
use crate::payload::{self, PROFILE, Payload};
use crate::query::Query;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Deep-merge `update` into `base` in place.
pub fn deep_merge(base: &mut Payload, update: Payload) {
    merge_into(base, update, "");
}

fn merge_into(base: &mut Map<String, Value>, update: Map<String, Value>, path: &str) {
    for (key, incoming) in update {
        let key_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        let Some(existing) = base.get_mut(&key) else {
            base.insert(key, incoming);
            continue;
        };
        match (existing, incoming) {
            (Value::Object(existing), Value::Object(incoming)) => {
                merge_into(existing, incoming, &key_path);
            }
            (Value::Array(existing), Value::Array(incoming)) => {
                existing.extend(incoming);
            }
            (_, Value::Null) => {}
            (existing, incoming) => {
                if !existing.is_null() && payload::kind(existing) != payload::kind(&incoming) {
                    debug!(
                        "merge type conflict at '{}': {} replaced by {}",
                        key_path,
                        payload::kind(existing),
                        payload::kind(&incoming)
                    );
                }
                *existing = incoming;
            }
        }
    }
}

/// Fold `payloads` in iteration order onto `seed`.
pub fn merge_payloads<I>(seed: Payload, payloads: I) -> Payload
where
    I: IntoIterator<Item = Payload>,
{
    payloads.into_iter().fold(seed, |mut acc, next| {
        deep_merge(&mut acc, next);
        acc
    })
}

/// Fill `profile.domain` and `profile.name` from the query when no source supplied them.
pub fn resolve_identity(merged: &mut Payload, query: &Query) {
    let profile = match merged
        .entry(PROFILE.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(profile) => profile,
        other => {
            warn!(
                "'profile' section is a {}, not a mapping; skipping name/domain resolution",
                payload::kind(other)
            );
            return;
        }
    };
    if let Some(domain) = query.domain()
        && payload::is_blank(profile.get("domain"))
    {
        profile.insert("domain".into(), Value::String(domain.to_string()));
    }
    if let Some(name) = query.name()
        && payload::is_blank(profile.get("name"))
    {
        profile.insert("name".into(), Value::String(name.to_string()));
    }
}

/// Load a caller-supplied seed payload. Missing files are fatal.
pub async fn load_seed(path: &Path) -> Result<Payload> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SignalError::SeedNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => {
            debug!("Loaded seed payload with {} sections from {}", map.len(), path.display());
            Ok(map)
        }
        other => Err(SignalError::InvalidQuery {
            message: format!(
                "seed payload {} must be a JSON object, got {}",
                path.display(),
                payload::kind(&other)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(v: Value) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn nested_mappings_merge_key_by_key() {
        let mut base = p(json!({"profile": {"name": "Acme", "meta": {"a": 1}}}));
        deep_merge(
            &mut base,
            p(json!({"profile": {"domain": "acme.io", "meta": {"b": 2}}})),
        );
        assert_eq!(
            Value::Object(base),
            json!({"profile": {"name": "Acme", "domain": "acme.io", "meta": {"a": 1, "b": 2}}})
        );
    }

    #[test]
    fn sequences_concatenate_with_duplicates() {
        let mut base = p(json!({"founders": [{"name": "A"}]}));
        deep_merge(&mut base, p(json!({"founders": [{"name": "A"}, {"name": "B"}]})));
        assert_eq!(base["founders"].as_array().unwrap().len(), 3);
        assert_eq!(base["founders"][2]["name"], "B");
    }

    #[test]
    fn null_never_erases() {
        let mut base = p(json!({"funding": {"stage": "Seed"}, "hiring": [1]}));
        deep_merge(&mut base, p(json!({"funding": {"stage": null}, "hiring": null})));
        assert_eq!(base["funding"]["stage"], "Seed");
        assert_eq!(base["hiring"], json!([1]));
    }

    #[test]
    fn later_scalar_wins_and_type_conflicts_overwrite() {
        let merged = merge_payloads(
            Payload::new(),
            vec![
                p(json!({"profile": {"name": "First"}, "market": {"size_usd": 1}})),
                p(json!({"profile": {"name": "Second"}, "market": "big"})),
            ],
        );
        assert_eq!(merged["profile"]["name"], "Second");
        assert_eq!(merged["market"], "big");
    }

    #[test]
    fn mapping_replaced_by_scalar_on_conflict() {
        let mut base = p(json!({"competition": {"competitor_count": 4}, "profile": {"age": 3}}));
        deep_merge(
            &mut base,
            p(json!({"competition": 7, "profile": {"age": "three"}})),
        );
        assert_eq!(base["competition"], 7);
        assert_eq!(base["profile"]["age"], "three");
    }

    #[test]
    fn sequence_replaced_by_mapping_on_conflict() {
        let mut base = p(json!({"founders": [{"name": "A"}], "knowledge": {"tags": ["ai"]}}));
        deep_merge(
            &mut base,
            p(json!({"founders": {"name": "B"}, "knowledge": {"tags": {"primary": "ml"}}})),
        );
        assert_eq!(base["founders"], json!({"name": "B"}));
        assert_eq!(base["knowledge"]["tags"], json!({"primary": "ml"}));
    }

    #[test]
    fn absent_key_inserted_as_is_even_when_null() {
        let merged = merge_payloads(Payload::new(), vec![p(json!({"knowledge": null}))]);
        assert!(merged.contains_key("knowledge"));
    }

    #[test]
    fn empty_payload_is_a_no_op() {
        let base = p(json!({"product": {"pmf": "Strong"}}));
        let merged = merge_payloads(base.clone(), vec![Payload::new(), Payload::new()]);
        assert_eq!(merged, base);
    }

    #[test]
    fn identity_falls_back_to_query() {
        let mut merged = p(json!({"profile": {"name": "", "domain": null}}));
        let q = Query::for_name("Acme").with_domain("acme.io");
        resolve_identity(&mut merged, &q);
        assert_eq!(merged["profile"]["name"], "Acme");
        assert_eq!(merged["profile"]["domain"], "acme.io");
    }

    #[test]
    fn identity_keeps_source_values() {
        let mut merged = p(json!({"profile": {"name": "Acme Inc", "domain": "acme.com"}}));
        resolve_identity(&mut merged, &Query::for_name("Acme").with_domain("acme.io"));
        assert_eq!(merged["profile"]["name"], "Acme Inc");
        assert_eq!(merged["profile"]["domain"], "acme.com");
    }

    #[test]
    fn identity_leaves_scalar_profile_alone() {
        let mut merged = p(json!({"profile": "opaque"}));
        resolve_identity(&mut merged, &Query::for_name("Acme"));
        assert_eq!(merged["profile"], "opaque");
    }

    #[tokio::test]
    async fn missing_seed_is_fatal() {
        let err = load_seed(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::SeedNotFound { .. }));
    }

    #[tokio::test]
    async fn seed_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            load_seed(&path).await.unwrap_err(),
            SignalError::InvalidQuery { .. }
        ));

        std::fs::write(&path, r#"{"profile": {"timing": "Early"}}"#).unwrap();
        let seed = load_seed(&path).await.unwrap();
        assert_eq!(seed["profile"]["timing"], "Early");
    }
}
