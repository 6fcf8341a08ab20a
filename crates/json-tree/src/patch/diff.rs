//! Structural diff: plan the edit operations that turn one tree into
//! another.
//!
//! Objects are compared by key set (member order does not matter):
//! removes for keys absent from the destination, adds for new keys,
//! recursion on shared keys. Arrays are compared element-wise by
//! position: the common prefix is recursed, surplus source elements are
//! removed end-first (so earlier removes do not shift later paths), and
//! surplus destination elements are appended. Any scalar or kind mismatch
//! becomes a whole-value `replace`.

use crate::store::node::{NodeData, NodeId};
use crate::store::NodeStore;

use super::op::PatchOp;

/// Plan the operations transforming `from` into `to`. Value ids in the
/// result point into the `to` tree; encoding clones them.
pub(crate) fn diff_nodes(store: &NodeStore, from: NodeId, to: NodeId) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    let mut path = Vec::new();
    diff_at(store, &mut ops, &mut path, from, to);
    ops
}

fn diff_at(
    store: &NodeStore,
    ops: &mut Vec<PatchOp>,
    path: &mut Vec<String>,
    a: NodeId,
    b: NodeId,
) {
    match (store.data(a), store.data(b)) {
        (Some(NodeData::Object(x)), Some(NodeData::Object(y))) => {
            for key in x.keys() {
                if !y.contains_key(key) {
                    path.push(key.clone());
                    ops.push(PatchOp::Remove { path: path.clone() });
                    path.pop();
                }
            }
            for (key, &b_child) in y {
                path.push(key.clone());
                match x.get(key) {
                    Some(&a_child) => diff_at(store, ops, path, a_child, b_child),
                    None => ops.push(PatchOp::Add {
                        path: path.clone(),
                        value: b_child,
                    }),
                }
                path.pop();
            }
        }
        (Some(NodeData::Array(x)), Some(NodeData::Array(y))) => {
            let shared = x.len().min(y.len());
            for i in 0..shared {
                path.push(i.to_string());
                diff_at(store, ops, path, x[i], y[i]);
                path.pop();
            }
            for i in (shared..x.len()).rev() {
                path.push(i.to_string());
                ops.push(PatchOp::Remove { path: path.clone() });
                path.pop();
            }
            for (i, &b_child) in y.iter().enumerate().skip(shared) {
                path.push(i.to_string());
                ops.push(PatchOp::Add {
                    path: path.clone(),
                    value: b_child,
                });
                path.pop();
            }
        }
        _ => {
            if !store.node_equal(a, b) {
                ops.push(PatchOp::Replace {
                    path: path.clone(),
                    value: b,
                });
            }
        }
    }
}
