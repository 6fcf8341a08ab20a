//! Edit-operation model and its tree encoding.
//!
//! Operations are encoded as JSON objects with `op` and `path` members
//! (paths as RFC 6901 pointer strings), plus `value` for `add`, `replace`,
//! and `test`, or `from` for `move` and `copy`. The `value` of a planned
//! operation references a node in some existing tree; encoding clones it
//! into the patch, so a patch never aliases the trees it was computed from.

use indexmap::IndexMap;
use thiserror::Error;

use json_tree_pointer::{format_pointer, parse_pointer};

use crate::store::node::{NodeData, NodeId};
use crate::store::NodeStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// An operation path (or `from` path) did not resolve in the current
    /// state of the target tree.
    #[error("NOT_FOUND")]
    NotFound,
    /// A `test` operation's expected value did not match.
    #[error("TEST")]
    Test,
    /// An array token was not a valid index, or the index was past the
    /// insertable range.
    #[error("INVALID_INDEX")]
    InvalidIndex,
    /// The operation addressed a node that cannot take it: a scalar used
    /// as a container, removal of the root, a move into its own subtree.
    #[error("INVALID_TARGET")]
    InvalidTarget,
    /// The patch itself is malformed.
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

/// One edit operation, with its path already split into unescaped tokens.
#[derive(Debug, Clone)]
pub(crate) enum PatchOp {
    Add { path: Vec<String>, value: NodeId },
    Remove { path: Vec<String> },
    Replace { path: Vec<String>, value: NodeId },
    Move { path: Vec<String>, from: Vec<String> },
    Copy { path: Vec<String>, from: Vec<String> },
    Test { path: Vec<String>, value: NodeId },
}

impl PatchOp {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
            PatchOp::Move { .. } => "move",
            PatchOp::Copy { .. } => "copy",
            PatchOp::Test { .. } => "test",
        }
    }

    pub(crate) fn path(&self) -> &[String] {
        match self {
            PatchOp::Add { path, .. } => path,
            PatchOp::Remove { path } => path,
            PatchOp::Replace { path, .. } => path,
            PatchOp::Move { path, .. } => path,
            PatchOp::Copy { path, .. } => path,
            PatchOp::Test { path, .. } => path,
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────

/// Build a patch tree (array of operation objects) from planned ops.
pub(crate) fn encode_ops(store: &mut NodeStore, ops: &[PatchOp]) -> Option<NodeId> {
    let patch = store.alloc(NodeData::Array(Vec::with_capacity(ops.len())));
    for op in ops {
        let encoded = encode_op(store, op)?;
        store.attach_push(patch, encoded);
    }
    Some(patch)
}

fn encode_op(store: &mut NodeStore, op: &PatchOp) -> Option<NodeId> {
    let obj = store.alloc(NodeData::Object(IndexMap::new()));
    let name = store.alloc(NodeData::String(op.name().to_string()));
    store.attach_member(obj, "op".to_string(), name);
    let path = store.alloc(NodeData::String(format_pointer(op.path())));
    store.attach_member(obj, "path".to_string(), path);
    match op {
        PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } | PatchOp::Test { value, .. } => {
            let copy = store.clone_subtree(*value)?;
            store.attach_member(obj, "value".to_string(), copy);
        }
        PatchOp::Move { from, .. } | PatchOp::Copy { from, .. } => {
            let from_ptr = store.alloc(NodeData::String(format_pointer(from)));
            store.attach_member(obj, "from".to_string(), from_ptr);
        }
        PatchOp::Remove { .. } => {}
    }
    Some(obj)
}

// ── Decoding ──────────────────────────────────────────────────────────────

/// Decode one operation object out of a patch tree. The returned op's
/// `value` id still points into the patch; executing it clones on demand.
pub(crate) fn decode_op(store: &NodeStore, node: NodeId) -> Result<PatchOp, PatchError> {
    let Some(NodeData::Object(members)) = store.data(node) else {
        return Err(PatchError::InvalidOp("operation must be an object".into()));
    };

    let name = match members.get("op").and_then(|&id| store.data(id)) {
        Some(NodeData::String(s)) => s.as_str(),
        _ => return Err(PatchError::InvalidOp("missing 'op' member".into())),
    };
    let path = decode_path(store, members, "path")?
        .ok_or_else(|| PatchError::InvalidOp("missing 'path' member".into()))?;

    match name {
        "add" => Ok(PatchOp::Add {
            path,
            value: decode_value(members, "add")?,
        }),
        "remove" => Ok(PatchOp::Remove { path }),
        "replace" => Ok(PatchOp::Replace {
            path,
            value: decode_value(members, "replace")?,
        }),
        "move" => Ok(PatchOp::Move {
            path,
            from: decode_path(store, members, "from")?
                .ok_or_else(|| PatchError::InvalidOp("move requires 'from'".into()))?,
        }),
        "copy" => Ok(PatchOp::Copy {
            path,
            from: decode_path(store, members, "from")?
                .ok_or_else(|| PatchError::InvalidOp("copy requires 'from'".into()))?,
        }),
        "test" => Ok(PatchOp::Test {
            path,
            value: decode_value(members, "test")?,
        }),
        other => Err(PatchError::InvalidOp(format!("unknown op: {other}"))),
    }
}

fn decode_path(
    store: &NodeStore,
    members: &IndexMap<String, NodeId>,
    key: &str,
) -> Result<Option<Vec<String>>, PatchError> {
    let Some(&id) = members.get(key) else {
        return Ok(None);
    };
    let Some(NodeData::String(pointer)) = store.data(id) else {
        return Err(PatchError::InvalidOp(format!("'{key}' must be a string")));
    };
    parse_pointer(pointer)
        .map(Some)
        .map_err(|_| PatchError::InvalidOp(format!("'{key}' is not a pointer: {pointer}")))
}

fn decode_value(members: &IndexMap<String, NodeId>, op: &str) -> Result<NodeId, PatchError> {
    members
        .get("value")
        .copied()
        .ok_or_else(|| PatchError::InvalidOp(format!("{op} requires 'value'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_shapes() {
        let mut store = NodeStore::new();
        let value = store.alloc(NodeData::Bool(true));
        let ops = vec![
            PatchOp::Add {
                path: vec!["a".into()],
                value,
            },
            PatchOp::Remove {
                path: vec!["b".into(), "0".into()],
            },
            PatchOp::Move {
                path: vec!["c".into()],
                from: vec!["d".into()],
            },
        ];
        let patch = encode_ops(&mut store, &ops).unwrap();
        let rendered = store.export(patch).unwrap();
        assert_eq!(
            rendered,
            serde_json::json!([
                {"op": "add", "path": "/a", "value": true},
                {"op": "remove", "path": "/b/0"},
                {"op": "move", "path": "/c", "from": "/d"},
            ])
        );
    }

    #[test]
    fn encoded_value_is_a_copy() {
        let mut store = NodeStore::new();
        let value = store.alloc(NodeData::String("x".into()));
        let ops = vec![PatchOp::Add {
            path: vec![],
            value,
        }];
        let patch = encode_ops(&mut store, &ops).unwrap();
        store.free_subtree(value);
        let rendered = store.export(patch).unwrap();
        assert_eq!(rendered[0]["value"], serde_json::json!("x"));
    }

    #[test]
    fn decode_all_ops() {
        let mut store = NodeStore::new();
        let patch = store.parse(
            r#"[
                {"op": "add", "path": "/a", "value": 1},
                {"op": "remove", "path": "/b"},
                {"op": "replace", "path": "", "value": {}},
                {"op": "move", "path": "/c", "from": "/d"},
                {"op": "copy", "path": "/e", "from": "/f"},
                {"op": "test", "path": "/g", "value": null}
            ]"#,
        );
        let id = store.resolve(&patch).unwrap();
        let ops: Vec<NodeId> = match store.data(id) {
            Some(NodeData::Array(ops)) => ops.clone(),
            other => panic!("expected array, got {other:?}"),
        };
        let names: Vec<&str> = ops
            .iter()
            .map(|&node| decode_op(&store, node).unwrap().name())
            .collect();
        assert_eq!(names, ["add", "remove", "replace", "move", "copy", "test"]);
    }

    #[test]
    fn decode_rejects_malformed_ops() {
        let mut store = NodeStore::new();
        for (text, fragment) in [
            (r#"[42]"#, "must be an object"),
            (r#"[{"path": "/a"}]"#, "missing 'op'"),
            (r#"[{"op": "add", "value": 1}]"#, "missing 'path'"),
            (r#"[{"op": "add", "path": "/a"}]"#, "requires 'value'"),
            (r#"[{"op": "move", "path": "/a"}]"#, "requires 'from'"),
            (r#"[{"op": "add", "path": "nope", "value": 1}]"#, "not a pointer"),
            (r#"[{"op": "frobnicate", "path": "/a"}]"#, "unknown op"),
        ] {
            let patch = store.parse(text);
            let id = store.resolve(&patch).unwrap();
            let op_node = match store.data(id) {
                Some(NodeData::Array(ops)) => ops[0],
                other => panic!("expected array, got {other:?}"),
            };
            match decode_op(&store, op_node) {
                Err(PatchError::InvalidOp(reason)) => {
                    assert!(reason.contains(fragment), "{reason} vs {fragment}")
                }
                other => panic!("expected InvalidOp, got {other:?}"),
            }
        }
    }
}
