//! Structural diff and patch (RFC 6902).
//!
//! A patch is an ordered JSON array of operation objects
//! (`{"op": ..., "path": ..., ...}`) living in the store like any other
//! tree. [`NodeStore::diff`] produces one; [`NodeStore::apply_patch`]
//! replays one against a target tree in place. Diff emits only `add`,
//! `remove`, and `replace`; apply additionally accepts `move`, `copy`,
//! and `test`.

pub(crate) mod apply;
pub(crate) mod diff;
pub(crate) mod op;

pub use op::PatchError;

use crate::handle::Handle;
use crate::store::node::NodeData;
use crate::store::NodeStore;

impl NodeStore {
    /// Compute a patch that transforms `from` into `to`.
    ///
    /// Returns an owned handle to a fresh patch tree (an empty array when
    /// the two trees are structurally equal), or an invalid handle when
    /// either input is invalid. Applying the result to a tree structurally
    /// equal to `from` yields a tree structurally equal to `to`.
    pub fn diff(&mut self, from: &Handle, to: &Handle) -> Handle {
        let (Some(a), Some(b)) = (self.resolve(from), self.resolve(to)) else {
            return Handle::invalid();
        };
        let ops = diff::diff_nodes(self, a, b);
        match op::encode_ops(self, &ops) {
            Some(patch) => Handle::owned(patch),
            None => Handle::invalid(),
        }
    }

    /// Execute a patch against `target`, strictly in sequence, mutating
    /// the tree in place.
    ///
    /// On failure, operations executed before the failing one remain
    /// applied; there is no rollback. Callers needing atomicity should
    /// snapshot with [`clone_tree`](NodeStore::clone_tree) first.
    pub fn apply_patch(&mut self, target: &Handle, patch: &Handle) -> Result<(), PatchError> {
        let target_id = self.resolve(target).ok_or(PatchError::InvalidTarget)?;
        let patch_id = self.resolve(patch).ok_or(PatchError::InvalidTarget)?;
        let op_nodes = match self.data(patch_id) {
            Some(NodeData::Array(ops)) => ops.clone(),
            _ => return Err(PatchError::InvalidOp("patch must be an array".into())),
        };
        for op_node in op_nodes {
            let op = op::decode_op(self, op_node)?;
            apply::apply_op(self, target_id, &op)?;
        }
        Ok(())
    }
}
