//! The node store: a generational arena of JSON tree nodes.
//!
//! All "pointers" between nodes are `NodeId` indices into the store's
//! slot vector, never references. Freeing a subtree bumps the generation
//! of every slot it occupied, so ids held elsewhere (inside [`Handle`]s or
//! other containers) stop resolving instead of dangling.
//!
//! This module owns the low-level tree primitives (allocate, free,
//! attach, detach, clone, compare, resolve) and nothing about ownership
//! tags or edit operations. The handle-facing API lives in
//! [`value`](crate::value) and [`mutate`](crate::mutate), the diff/patch
//! machinery in [`patch`](crate::patch).

pub(crate) mod codec;
pub(crate) mod node;

use indexmap::IndexMap;
use json_tree_pointer::is_valid_index;

use crate::handle::Handle;
use node::{Entry, NodeData, NodeId, Slot};

/// Arena of JSON nodes. One store can hold any number of independent
/// trees; handles are only meaningful against the store that created them.
#[derive(Debug)]
pub struct NodeStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl NodeStore {
    pub fn new() -> Self {
        NodeStore {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live nodes across all trees in the store. Diagnostic;
    /// useful for asserting that replaced or removed subtrees were freed.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    // ── Slot plumbing ─────────────────────────────────────────────────────

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let entry = Entry { data, parent: None };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn entry(&self, id: NodeId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.entry(id).map(|entry| &entry.data)
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.entry_mut(id).map(|entry| &mut entry.data)
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = parent;
        }
    }

    /// Node behind a handle, if the handle still refers to a live slot.
    pub(crate) fn resolve(&self, handle: &Handle) -> Option<NodeId> {
        let id = handle.node?;
        self.entry(id)?;
        Some(id)
    }

    /// Vacate one slot, bumping its generation. Children are untouched;
    /// callers either freed them already or re-homed them.
    fn release_slot(&mut self, id: NodeId) -> Option<Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entry)
    }

    // ── Subtree operations ────────────────────────────────────────────────

    /// Free a node and everything below it.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(entry) = self.release_slot(id) else {
                continue;
            };
            match entry.data {
                NodeData::Array(children) => pending.extend(children),
                NodeData::Object(members) => pending.extend(members.into_values()),
                _ => {}
            }
        }
    }

    /// Free a container's content, leaving the node itself allocated as an
    /// empty shell (`Null`). The id stays valid.
    pub(crate) fn clear_node(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.data(id) {
            Some(NodeData::Array(children)) => children.clone(),
            Some(NodeData::Object(members)) => members.values().copied().collect(),
            _ => Vec::new(),
        };
        for child in children {
            self.free_subtree(child);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.data = NodeData::Null;
        }
    }

    /// Move `src`'s payload into `dst`, re-homing `src`'s children under
    /// `dst` and vacating `src`'s slot. `dst` keeps its id and parent, so
    /// handles to it observe the new value in place. `dst`'s previous
    /// content must already be cleared or freed.
    pub(crate) fn transplant(&mut self, dst: NodeId, src: NodeId) {
        let Some(entry) = self.release_slot(src) else {
            return;
        };
        let children: Vec<NodeId> = match &entry.data {
            NodeData::Array(children) => children.clone(),
            NodeData::Object(members) => members.values().copied().collect(),
            _ => Vec::new(),
        };
        if let Some(dst_entry) = self.entry_mut(dst) {
            dst_entry.data = entry.data;
        }
        for child in children {
            self.set_parent(child, Some(dst));
        }
    }

    /// Deep-copy a subtree into a fresh root.
    pub(crate) fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.data(id)?.clone();
        match data {
            NodeData::Array(children) => {
                let copy = self.alloc(NodeData::Array(Vec::with_capacity(children.len())));
                for child in children {
                    let child_copy = self.clone_subtree(child)?;
                    self.attach_push(copy, child_copy);
                }
                Some(copy)
            }
            NodeData::Object(members) => {
                let copy = self.alloc(NodeData::Object(IndexMap::with_capacity(members.len())));
                for (key, child) in members {
                    let child_copy = self.clone_subtree(child)?;
                    self.attach_member(copy, key, child_copy);
                }
                Some(copy)
            }
            leaf => Some(self.alloc(leaf)),
        }
    }

    // ── Attach / detach ───────────────────────────────────────────────────

    /// Attach `child` under an object member. The parent must be an
    /// Object and the child a root. Returns the displaced child when the
    /// key was already present (its parent link is cleared; the caller
    /// decides whether to free or re-home it). An existing key keeps its
    /// position in the member order.
    pub(crate) fn attach_member(
        &mut self,
        parent: NodeId,
        key: String,
        child: NodeId,
    ) -> Option<NodeId> {
        let displaced = match self.data_mut(parent) {
            Some(NodeData::Object(members)) => members.insert(key, child),
            _ => return None,
        };
        self.set_parent(child, Some(parent));
        if let Some(old) = displaced {
            self.set_parent(old, None);
        }
        displaced
    }

    /// Insert `child` into an array at `index` (clamped to the length).
    pub(crate) fn attach_insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let inserted = match self.data_mut(parent) {
            Some(NodeData::Array(children)) => {
                let index = index.min(children.len());
                children.insert(index, child);
                true
            }
            _ => false,
        };
        if inserted {
            self.set_parent(child, Some(parent));
        }
    }

    /// Append `child` at the end of an array.
    pub(crate) fn attach_push(&mut self, parent: NodeId, child: NodeId) {
        let pushed = match self.data_mut(parent) {
            Some(NodeData::Array(children)) => {
                children.push(child);
                true
            }
            _ => false,
        };
        if pushed {
            self.set_parent(child, Some(parent));
        }
    }

    /// Detach an object member, making it a root. `None` when the parent
    /// is not an object or the key is absent. The member order closes up
    /// (a later re-attach lands at the end).
    pub(crate) fn detach_member(&mut self, parent: NodeId, key: &str) -> Option<NodeId> {
        let detached = match self.data_mut(parent) {
            Some(NodeData::Object(members)) => members.shift_remove(key),
            _ => None,
        }?;
        self.set_parent(detached, None);
        Some(detached)
    }

    /// Detach an array element, making it a root. `None` when the parent
    /// is not an array or the index is out of range.
    pub(crate) fn detach_index(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let detached = match self.data_mut(parent) {
            Some(NodeData::Array(children)) if index < children.len() => {
                Some(children.remove(index))
            }
            _ => None,
        }?;
        self.set_parent(detached, None);
        Some(detached)
    }

    /// Would attaching `child` under `parent` create a cycle? True when
    /// `parent` lies inside `child`'s subtree (or is `child` itself).
    pub(crate) fn would_cycle(&self, parent: NodeId, child: NodeId) -> bool {
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return true;
            }
            cursor = self.entry(id).and_then(|entry| entry.parent);
        }
        false
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Structural equality: objects by key set (order-insensitive), arrays
    /// element-wise by position, numbers by `f64` value.
    pub(crate) fn node_equal(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(x), Some(y)) = (self.data(a), self.data(b)) else {
            return false;
        };
        match (x, y) {
            (NodeData::Null, NodeData::Null) => true,
            (NodeData::Bool(x), NodeData::Bool(y)) => x == y,
            (NodeData::Number(x), NodeData::Number(y)) => x.as_f64() == y.as_f64(),
            (NodeData::String(x), NodeData::String(y)) => x == y,
            (NodeData::Array(x), NodeData::Array(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|(&m, &n)| self.node_equal(m, n))
            }
            (NodeData::Object(x), NodeData::Object(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(key, &m)| match y.get(key) {
                        Some(&n) => self.node_equal(m, n),
                        None => false,
                    })
            }
            _ => false,
        }
    }

    /// Walk unescaped pointer tokens down from `start`. Array tokens must
    /// be valid indices in range; `-` never resolves for reads.
    pub(crate) fn resolve_tokens(&self, start: NodeId, tokens: &[String]) -> Option<NodeId> {
        let mut current = start;
        self.entry(current)?;
        for token in tokens {
            current = match self.data(current)? {
                NodeData::Object(members) => *members.get(token.as_str())?,
                NodeData::Array(children) => {
                    if !is_valid_index(token) {
                        return None;
                    }
                    let index: usize = token.parse().ok()?;
                    *children.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
