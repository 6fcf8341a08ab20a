//! Boundary between arena subtrees and `serde_json` values.
//!
//! Parsing and rendering are delegated to `serde_json`; this module only
//! moves data across the boundary. Object member order survives both
//! directions (`preserve_order` on the `serde_json` side, `IndexMap` on
//! the arena side).

use indexmap::IndexMap;
use serde_json::Value;

use super::node::{NodeData, NodeId};
use super::NodeStore;

impl NodeStore {
    /// Intern a parsed value as a fresh root subtree.
    pub(crate) fn intern(&mut self, value: Value) -> NodeId {
        match value {
            Value::Null => self.alloc(NodeData::Null),
            Value::Bool(b) => self.alloc(NodeData::Bool(b)),
            Value::Number(n) => self.alloc(NodeData::Number(n)),
            Value::String(s) => self.alloc(NodeData::String(s)),
            Value::Array(items) => {
                let id = self.alloc(NodeData::Array(Vec::with_capacity(items.len())));
                for item in items {
                    let child = self.intern(item);
                    self.attach_push(id, child);
                }
                id
            }
            Value::Object(members) => {
                let id = self.alloc(NodeData::Object(IndexMap::with_capacity(members.len())));
                for (key, member) in members {
                    let child = self.intern(member);
                    self.attach_member(id, key, child);
                }
                id
            }
        }
    }

    /// Export a subtree back into a `serde_json` value. `None` only when
    /// the id no longer resolves.
    pub(crate) fn export(&self, id: NodeId) -> Option<Value> {
        match self.data(id)? {
            NodeData::Null => Some(Value::Null),
            NodeData::Bool(b) => Some(Value::Bool(*b)),
            NodeData::Number(n) => Some(Value::Number(n.clone())),
            NodeData::String(s) => Some(Value::String(s.clone())),
            NodeData::Array(children) => {
                let mut items = Vec::with_capacity(children.len());
                for &child in children {
                    items.push(self.export(child)?);
                }
                Some(Value::Array(items))
            }
            NodeData::Object(members) => {
                let mut out = serde_json::Map::new();
                for (key, &child) in members {
                    out.insert(key.clone(), self.export(child)?);
                }
                Some(Value::Object(out))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intern_export_roundtrip() {
        let mut store = NodeStore::new();
        let value = json!({"b": 1, "a": [true, null, "x"], "c": {"nested": 2.5}});
        let id = store.intern(value.clone());
        assert_eq!(store.export(id), Some(value));
    }

    #[test]
    fn intern_preserves_member_order() {
        let mut store = NodeStore::new();
        let id = store.intern(json!({"z": 1, "a": 2, "m": 3}));
        let exported = store.export(id).unwrap();
        let keys: Vec<&String> = exported.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn interned_children_have_parent_links() {
        let mut store = NodeStore::new();
        let id = store.intern(json!([1, 2]));
        let children = match store.data(id) {
            Some(NodeData::Array(children)) => children.clone(),
            other => panic!("expected array, got {other:?}"),
        };
        for child in children {
            assert_eq!(store.entry(child).unwrap().parent, Some(id));
        }
    }
}
