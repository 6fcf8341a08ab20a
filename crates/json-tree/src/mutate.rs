//! Mutation API: typed setters, appenders, and removers.
//!
//! Containers coerce on first mismatched use: the first `set_*` against a
//! non-Object frees its content and re-types the node as an empty Object
//! in place, and likewise `append_*` against a non-Array. The node id is
//! preserved, so existing handles (borrowed ones included) stay valid and
//! observe the new shape. This is deliberate ergonomics, not an error
//! path.
//!
//! Every mutator is a silent no-op on unusable input: an invalid
//! container, an invalid or borrowed value handle, a value still attached
//! elsewhere, or an attach that would create a cycle. A value handle is
//! consumed either way; when the mutation is skipped because the container
//! is unusable, the orphaned value subtree is reclaimed (a moved handle
//! cannot be released by the caller afterwards).
//!
//! Mutators return `&mut Self` so call sites can chain.

use crate::handle::{Handle, Ownership};
use crate::store::node::{NodeData, NodeId};
use crate::store::NodeStore;

impl NodeStore {
    // ── Object setters ────────────────────────────────────────────────────

    /// Attach `value` under `key`, replacing (and freeing) any existing
    /// member. The container becomes an Object if it is not one already;
    /// the new member lands at the end of the member order.
    pub fn set(&mut self, container: &Handle, key: &str, value: Handle) -> &mut Self {
        let Some(container_id) = self.resolve(container) else {
            self.discard(value);
            return self;
        };
        let Some(value_id) = self.consume_value(value, container_id) else {
            return self;
        };
        self.coerce_object(container_id);
        if let Some(old) = self.detach_member(container_id, key) {
            self.free_subtree(old);
        }
        self.attach_member(container_id, key.to_string(), value_id);
        self
    }

    pub fn set_string(&mut self, container: &Handle, key: &str, value: &str) -> &mut Self {
        let leaf = self.create_string(value);
        self.set(container, key, leaf)
    }

    pub fn set_number(&mut self, container: &Handle, key: &str, value: f64) -> &mut Self {
        let leaf = self.create_number(value);
        self.set(container, key, leaf)
    }

    pub fn set_bool(&mut self, container: &Handle, key: &str, value: bool) -> &mut Self {
        let leaf = self.create_bool(value);
        self.set(container, key, leaf)
    }

    pub fn set_null(&mut self, container: &Handle, key: &str) -> &mut Self {
        let leaf = self.create_null();
        self.set(container, key, leaf)
    }

    // ── Array appenders ───────────────────────────────────────────────────

    /// Push `value` at the end of the array. The container becomes an
    /// Array if it is not one already; prior element order is preserved.
    pub fn append(&mut self, container: &Handle, value: Handle) -> &mut Self {
        let Some(container_id) = self.resolve(container) else {
            self.discard(value);
            return self;
        };
        let Some(value_id) = self.consume_value(value, container_id) else {
            return self;
        };
        self.coerce_array(container_id);
        self.attach_push(container_id, value_id);
        self
    }

    pub fn append_string(&mut self, container: &Handle, value: &str) -> &mut Self {
        let leaf = self.create_string(value);
        self.append(container, leaf)
    }

    pub fn append_number(&mut self, container: &Handle, value: f64) -> &mut Self {
        let leaf = self.create_number(value);
        self.append(container, leaf)
    }

    pub fn append_bool(&mut self, container: &Handle, value: bool) -> &mut Self {
        let leaf = self.create_bool(value);
        self.append(container, leaf)
    }

    pub fn append_null(&mut self, container: &Handle) -> &mut Self {
        let leaf = self.create_null();
        self.append(container, leaf)
    }

    // ── Removers ──────────────────────────────────────────────────────────

    /// Detach and free the named member. No-op when the container is not
    /// an Object or the key is absent.
    pub fn remove_member(&mut self, container: &Handle, key: &str) -> &mut Self {
        if let Some(id) = self.resolve(container) {
            if let Some(old) = self.detach_member(id, key) {
                self.free_subtree(old);
            }
        }
        self
    }

    /// Detach and free the indexed element. No-op when the container is
    /// not an Array or the index is out of range.
    pub fn remove_index(&mut self, container: &Handle, index: usize) -> &mut Self {
        if let Some(id) = self.resolve(container) {
            if let Some(old) = self.detach_index(id, index) {
                self.free_subtree(old);
            }
        }
        self
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Validate a consumed value handle for attachment into `container`.
    /// `None` skips the mutation: the value must be owned, live, and a
    /// root, and must not contain the container. Nothing is freed on a
    /// skip; a borrowed or attached node belongs to someone else, and in
    /// the cycle case the value subtree holds the container itself.
    fn consume_value(&self, value: Handle, container: NodeId) -> Option<NodeId> {
        if value.ownership() != Ownership::Owned {
            return None;
        }
        let id = self.resolve(&value)?;
        if self.entry(id).and_then(|entry| entry.parent).is_some() {
            return None;
        }
        if self.would_cycle(container, id) {
            return None;
        }
        Some(id)
    }

    /// Reclaim a consumed value that never found a container. Only an
    /// owned, live root is ours to free.
    fn discard(&mut self, value: Handle) {
        if value.ownership() != Ownership::Owned {
            return;
        }
        let Some(id) = self.resolve(&value) else {
            return;
        };
        if self.entry(id).and_then(|entry| entry.parent).is_some() {
            return;
        }
        self.free_subtree(id);
    }

    fn coerce_object(&mut self, id: NodeId) {
        if matches!(self.data(id), Some(NodeData::Object(_))) {
            return;
        }
        self.clear_node(id);
        if let Some(entry) = self.entry_mut(id) {
            entry.data = NodeData::Object(indexmap::IndexMap::new());
        }
    }

    fn coerce_array(&mut self, id: NodeId) {
        if matches!(self.data(id), Some(NodeData::Array(_))) {
            return;
        }
        self.clear_node(id);
        if let Some(entry) = self.entry_mut(id) {
            entry.data = NodeData::Array(Vec::new());
        }
    }
}
