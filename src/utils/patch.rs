//! JSON-patch-style diffs between two [`WorkflowState`] snapshots
//! (spec §4.4). Only changed fields are emitted; `data` is diffed per key
//! rather than as a whole blob so a single changed key produces a single
//! operation.

use serde::{Deserialize, Serialize};

use crate::state::WorkflowState;

/// One changed field between two state snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOp {
    pub op: PatchKind,
    pub path: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchKind {
    /// The path's value was set (covers both "added" and "changed": the
    /// spec does not distinguish creation from mutation for scalar
    /// fields).
    Replace,
    /// The `messages` path grew; `value` carries only the appended
    /// suffix, not the whole list (spec §4.4: "one operation carrying the
    /// appended suffix").
    Append,
    /// A field present in `before` is absent in `after` (only possible
    /// for `currentNodeId`/`error`, the two optional fields).
    Remove,
}

/// Produces the ordered sequence of field-level changes from `before` to
/// `after`. Field order in the output follows the spec's listed path set:
/// `/step`, `/status`, `/currentNodeId`, `/data/<key>` (one per changed
/// key, insertion order of `after.data`... note `data`'s map has no
/// semantic order, so keys are compared but emitted in the iteration
/// order of the underlying map), `/messages`, `/error`.
#[must_use]
pub fn diff(before: &WorkflowState, after: &WorkflowState) -> Vec<PatchOp> {
    let mut ops = Vec::new();

    if before.step != after.step {
        ops.push(PatchOp {
            op: PatchKind::Replace,
            path: "/step".to_string(),
            value: serde_json::json!(after.step),
        });
    }

    if before.status != after.status {
        ops.push(PatchOp {
            op: PatchKind::Replace,
            path: "/status".to_string(),
            value: serde_json::json!(after.status),
        });
    }

    if before.current_node_id != after.current_node_id {
        match &after.current_node_id {
            Some(node_id) => ops.push(PatchOp {
                op: PatchKind::Replace,
                path: "/currentNodeId".to_string(),
                value: serde_json::json!(node_id),
            }),
            None => ops.push(PatchOp {
                op: PatchKind::Remove,
                path: "/currentNodeId".to_string(),
                value: serde_json::Value::Null,
            }),
        }
    }

    for (key, value) in after.data.iter() {
        if before.data.get(key) != Some(value) {
            ops.push(PatchOp {
                op: PatchKind::Replace,
                path: format!("/data/{key}"),
                value: value.clone(),
            });
        }
    }
    for key in before.data.keys() {
        if !after.data.contains_key(key) {
            ops.push(PatchOp {
                op: PatchKind::Remove,
                path: format!("/data/{key}"),
                value: serde_json::Value::Null,
            });
        }
    }

    if after.messages.len() > before.messages.len() && after.messages[..before.messages.len()] == before.messages[..] {
        let appended = &after.messages[before.messages.len()..];
        ops.push(PatchOp {
            op: PatchKind::Append,
            path: "/messages".to_string(),
            value: serde_json::json!(appended),
        });
    } else if before.messages != after.messages {
        ops.push(PatchOp {
            op: PatchKind::Replace,
            path: "/messages".to_string(),
            value: serde_json::json!(after.messages),
        });
    }

    if before.error != after.error {
        match &after.error {
            Some(error) => ops.push(PatchOp {
                op: PatchKind::Replace,
                path: "/error".to_string(),
                value: serde_json::json!(error),
            }),
            None => ops.push(PatchOp {
                op: PatchKind::Remove,
                path: "/error".to_string(),
                value: serde_json::Value::Null,
            }),
        }
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn no_changes_yields_empty_patch() {
        let state = WorkflowState::new("w", "t");
        assert!(diff(&state, &state).is_empty());
    }

    #[test]
    fn step_change_is_reported() {
        let before = WorkflowState::new("w", "t");
        let after = before.with_step(1);
        let ops = diff(&before, &after);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, "/step");
        assert_eq!(ops[0].op, PatchKind::Replace);
    }

    #[test]
    fn data_key_change_is_scoped_to_that_key() {
        let before = WorkflowState::new("w", "t").with_data("route", serde_json::json!("a"));
        let after = before.with_data("route", serde_json::json!("b"));
        let ops = diff(&before, &after);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, "/data/route");
        assert_eq!(ops[0].value, serde_json::json!("b"));
    }

    #[test]
    fn appended_messages_carry_only_the_suffix() {
        let before = WorkflowState::new("w", "t").with_message(Message::user("hi"));
        let after = before.with_message(Message::assistant("hello"));
        let ops = diff(&before, &after);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op, PatchKind::Append);
        let value = ops[0].value.as_array().unwrap();
        assert_eq!(value.len(), 1);
    }

    #[test]
    fn error_set_is_reported() {
        let before = WorkflowState::new("w", "t");
        let after = before.with_error("boom", None);
        let ops = diff(&before, &after);
        assert!(ops.iter().any(|op| op.path == "/error" && op.op == PatchKind::Replace));
        assert!(ops.iter().any(|op| op.path == "/status"));
    }
}
