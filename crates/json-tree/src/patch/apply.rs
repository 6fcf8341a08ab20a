//! Execute decoded edit operations against a target tree, in place.
//!
//! Paths resolve against the current (possibly already-patched) state of
//! the tree. A root-path `add`/`replace` re-types the target's root node
//! in place, so the caller's handle to the target stays valid.

use json_tree_pointer::is_valid_index;

use crate::store::node::{NodeData, NodeId};
use crate::store::NodeStore;

use super::op::{PatchError, PatchOp};

pub(crate) fn apply_op(
    store: &mut NodeStore,
    root: NodeId,
    op: &PatchOp,
) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => {
            let value = materialize(store, *value)?;
            insert(store, root, path, value, false).inspect_err(|_| store.free_subtree(value))
        }
        PatchOp::Remove { path } => {
            let removed = detach_at(store, root, path)?;
            store.free_subtree(removed);
            Ok(())
        }
        PatchOp::Replace { path, value } => {
            let value = materialize(store, *value)?;
            replace(store, root, path, value).inspect_err(|_| store.free_subtree(value))
        }
        PatchOp::Move { path, from } => {
            if path == from {
                return Ok(());
            }
            // moving a node into its own subtree would orphan the target
            if path.len() > from.len() && path[..from.len()] == from[..] {
                return Err(PatchError::InvalidTarget);
            }
            let value = detach_at(store, root, from)?;
            insert(store, root, path, value, false).inspect_err(|_| store.free_subtree(value))
        }
        PatchOp::Copy { path, from } => {
            let source = resolve(store, root, from)?;
            let value = store
                .clone_subtree(source)
                .ok_or(PatchError::NotFound)?;
            insert(store, root, path, value, false).inspect_err(|_| store.free_subtree(value))
        }
        PatchOp::Test { path, value } => {
            let actual = resolve(store, root, path)?;
            if store.node_equal(actual, *value) {
                Ok(())
            } else {
                Err(PatchError::Test)
            }
        }
    }
}

/// Clone an operation's value out of the patch tree so it can be attached
/// into the target.
fn materialize(store: &mut NodeStore, value: NodeId) -> Result<NodeId, PatchError> {
    store
        .clone_subtree(value)
        .ok_or_else(|| PatchError::InvalidOp("unresolvable operation value".into()))
}

fn resolve(store: &NodeStore, root: NodeId, path: &[String]) -> Result<NodeId, PatchError> {
    store
        .resolve_tokens(root, path)
        .ok_or(PatchError::NotFound)
}

/// Attach `value` at `path`. With `must_exist` (the `replace` half of the
/// contract) the addressed location has to be present already; without it
/// (`add`) an object member may be created and an array index may equal
/// the length, `-` meaning append.
fn insert(
    store: &mut NodeStore,
    root: NodeId,
    path: &[String],
    value: NodeId,
    must_exist: bool,
) -> Result<(), PatchError> {
    let Some((last, parent_path)) = path.split_last() else {
        return replace_root(store, root, value);
    };
    let parent = resolve(store, root, parent_path)?;
    match store.data(parent) {
        Some(NodeData::Object(members)) => {
            if must_exist && !members.contains_key(last.as_str()) {
                return Err(PatchError::NotFound);
            }
            // an existing member is displaced in place, keeping its position
            if let Some(old) = store.attach_member(parent, last.clone(), value) {
                store.free_subtree(old);
            }
            Ok(())
        }
        Some(NodeData::Array(children)) => {
            let len = children.len();
            let index = if last == "-" {
                if must_exist {
                    return Err(PatchError::NotFound);
                }
                len
            } else {
                if !is_valid_index(last) {
                    return Err(PatchError::InvalidIndex);
                }
                last.parse().map_err(|_| PatchError::InvalidIndex)?
            };
            if must_exist {
                if index >= len {
                    return Err(PatchError::NotFound);
                }
                if let Some(old) = store.detach_index(parent, index) {
                    store.free_subtree(old);
                }
            } else if index > len {
                return Err(PatchError::InvalidIndex);
            }
            store.attach_insert(parent, index, value);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

fn replace(
    store: &mut NodeStore,
    root: NodeId,
    path: &[String],
    value: NodeId,
) -> Result<(), PatchError> {
    insert(store, root, path, value, true)
}

/// Detach the node at `path` from its container, making it a root.
fn detach_at(store: &mut NodeStore, root: NodeId, path: &[String]) -> Result<NodeId, PatchError> {
    let Some((last, parent_path)) = path.split_last() else {
        // the root is not inside any container
        return Err(PatchError::InvalidTarget);
    };
    let parent = resolve(store, root, parent_path)?;
    match store.data(parent) {
        Some(NodeData::Object(_)) => store
            .detach_member(parent, last)
            .ok_or(PatchError::NotFound),
        Some(NodeData::Array(_)) => {
            if !is_valid_index(last) {
                return Err(PatchError::InvalidIndex);
            }
            let index: usize = last.parse().map_err(|_| PatchError::InvalidIndex)?;
            store.detach_index(parent, index).ok_or(PatchError::NotFound)
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

/// Swap the target root's value for `value`'s payload, in place. The root
/// keeps its id, so the caller's handle continues to resolve.
fn replace_root(store: &mut NodeStore, root: NodeId, value: NodeId) -> Result<(), PatchError> {
    store.clear_node(root);
    store.transplant(root, value);
    Ok(())
}
