//! Canonical JSON encoding and SHA-256 digests for state/event hashing
//! (spec §4.4, invariant I3).
//!
//! Canonicalisation sorts object keys and leaves array order untouched
//! (array order is semantic for `messages`), so that two structurally
//! equal values always serialize to the same byte string regardless of
//! field insertion order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Re-encodes `value` with object keys sorted recursively. `serde_json`
/// already serializes `BTreeMap`-backed maps in key order, so the
/// canonical form is built by round-tripping every object through one.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> = std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k.clone(), canonicalize(v));
            }
            let reencoded: serde_json::Map<String, Value> = sorted.into_iter().collect();
            Value::Object(reencoded)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serializes `value` to its canonical JSON byte string: object keys
/// sorted, array order preserved, no whitespace.
#[must_use]
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let raw = serde_json::to_value(value).expect("serialization of hashable types never fails");
    let canonical = canonicalize(&raw);
    serde_json::to_vec(&canonical).expect("canonical value always re-serializes")
}

/// SHA-256 digest of `value`'s canonical JSON encoding, as a lowercase hex
/// string. Deterministic across runs for structurally equal inputs (I3).
#[must_use]
pub fn digest<T: Serialize>(value: &T) -> String {
    let bytes = canonical_json_bytes(value);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    encode_hex(&hasher.finalize())
}

fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String never fails");
    }
    out
}

/// Convenience alias used at `WorkflowState` hashing call sites.
#[must_use]
pub fn state_hash(state: &crate::state::WorkflowState) -> String {
    digest(state)
}

/// Convenience alias used at `StateEvent` hashing call sites.
#[must_use]
pub fn event_hash(event: &crate::events::StateEvent) -> String {
    digest(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    #[test]
    fn hash_is_deterministic_for_equal_values() {
        let a = WorkflowState::new("w", "t");
        let b = a.clone();
        assert_eq!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn hash_differs_when_a_field_differs() {
        let a = WorkflowState::new("w", "t");
        let b = a.with_step(1);
        assert_ne!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn key_order_does_not_affect_digest() {
        let left = serde_json::json!({"a": 1, "b": 2});
        let right = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(digest(&left), digest(&right));
    }

    #[test]
    fn array_order_does_affect_digest() {
        let left = serde_json::json!([1, 2, 3]);
        let right = serde_json::json!([3, 2, 1]);
        assert_ne!(digest(&left), digest(&right));
    }
}
