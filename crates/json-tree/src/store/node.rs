//! Raw node representation inside the arena.

use indexmap::IndexMap;
use serde_json::Number;

/// Key of an arena slot: index plus the generation the slot carried when the
/// node was allocated. A key whose generation no longer matches its slot
/// never resolves, so handles into freed subtrees degrade to `Invalid`
/// instead of observing whatever the slot was reused for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Stored payload of one node. Containers hold child ids, never inline
/// values; every child id must resolve to a live slot whose parent link
/// points back at the container.
#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<NodeId>),
    Object(IndexMap<String, NodeId>),
}

/// A live node: payload plus the parent link. `parent == None` marks a
/// root, the only kind of node an owned handle may free.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) entry: Option<Entry>,
}
