//! Handle-level value API: creation, parsing, type queries, scalar
//! accessors, lookups, serialization, and release.
//!
//! Lookup misses and type mismatches are not errors here: accessors fall
//! back to caller-supplied defaults and lookups return invalid handles,
//! per the invalid-handle taxonomy. The one `Result`-returning entry point
//! is [`NodeStore::try_parse`].

use serde_json::{Number, Value};
use thiserror::Error;

use json_tree_pointer::parse_pointer;

use crate::handle::{Handle, JsonType, Ownership};
use crate::store::node::NodeData;
use crate::store::NodeStore;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("SYNTAX: {0}")]
    Syntax(#[from] serde_json::Error),
}

/// Integral finite doubles become integer numbers so that `25.0` renders
/// as `25`. Beyond ±2^53 (the exact-integer range of `f64`) the value
/// stays floating point. JSON cannot encode non-finite numbers; those
/// store as zero.
fn number_from_f64(value: f64) -> Number {
    const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= EXACT_INT_LIMIT {
        Number::from(value as i64)
    } else {
        Number::from_f64(value).unwrap_or_else(|| Number::from(0))
    }
}

impl NodeStore {
    // ── Creation ──────────────────────────────────────────────────────────

    pub fn create_null(&mut self) -> Handle {
        Handle::owned(self.alloc(NodeData::Null))
    }

    pub fn create_bool(&mut self, value: bool) -> Handle {
        Handle::owned(self.alloc(NodeData::Bool(value)))
    }

    pub fn create_number(&mut self, value: f64) -> Handle {
        Handle::owned(self.alloc(NodeData::Number(number_from_f64(value))))
    }

    pub fn create_string(&mut self, value: &str) -> Handle {
        Handle::owned(self.alloc(NodeData::String(value.to_string())))
    }

    pub fn create_array(&mut self) -> Handle {
        Handle::owned(self.alloc(NodeData::Array(Vec::new())))
    }

    pub fn create_object(&mut self) -> Handle {
        Handle::owned(self.alloc(NodeData::Object(indexmap::IndexMap::new())))
    }

    /// Parse JSON text into an owned tree.
    ///
    /// Returns an invalid handle on malformed input; check
    /// [`type_of`](NodeStore::type_of) before use, or call
    /// [`try_parse`](NodeStore::try_parse) for the error itself.
    /// Duplicate object keys resolve last-write-wins.
    pub fn parse(&mut self, text: &str) -> Handle {
        self.try_parse(text).unwrap_or_else(|_| Handle::invalid())
    }

    /// `Result`-returning form of [`parse`](NodeStore::parse).
    pub fn try_parse(&mut self, text: &str) -> Result<Handle, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Handle::owned(self.intern(value)))
    }

    // ── Type queries ──────────────────────────────────────────────────────

    pub fn type_of(&self, handle: &Handle) -> JsonType {
        let Some(id) = self.resolve(handle) else {
            return JsonType::Invalid;
        };
        match self.data(id) {
            Some(NodeData::Null) => JsonType::Null,
            Some(NodeData::Bool(_)) => JsonType::Bool,
            Some(NodeData::Number(_)) => JsonType::Number,
            Some(NodeData::String(_)) => JsonType::String,
            Some(NodeData::Array(_)) => JsonType::Array,
            Some(NodeData::Object(_)) => JsonType::Object,
            None => JsonType::Invalid,
        }
    }

    pub fn is_null(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::Null
    }

    pub fn is_bool(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::Bool
    }

    pub fn is_number(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::Number
    }

    pub fn is_string(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::String
    }

    pub fn is_array(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::Array
    }

    pub fn is_object(&self, handle: &Handle) -> bool {
        self.type_of(handle) == JsonType::Object
    }

    // ── Scalar accessors ──────────────────────────────────────────────────

    /// Stored boolean, or `default` when the handle is not a Bool.
    pub fn get_bool(&self, handle: &Handle, default: bool) -> bool {
        match self.resolve(handle).and_then(|id| self.data(id)) {
            Some(NodeData::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Stored number as `f64`, or `default` when the handle is not a Number.
    pub fn get_number(&self, handle: &Handle, default: f64) -> f64 {
        match self.resolve(handle).and_then(|id| self.data(id)) {
            Some(NodeData::Number(n)) => n.as_f64().unwrap_or(default),
            _ => default,
        }
    }

    /// Stored string slice, or `default` when the handle is not a String.
    pub fn get_string<'a>(&'a self, handle: &Handle, default: &'a str) -> &'a str {
        match self.resolve(handle).and_then(|id| self.data(id)) {
            Some(NodeData::String(s)) => s.as_str(),
            _ => default,
        }
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Borrowed handle to an object member; invalid when the handle is not
    /// an Object or the key is absent.
    pub fn get_member(&self, handle: &Handle, key: &str) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        match self.data(id) {
            Some(NodeData::Object(members)) => match members.get(key) {
                Some(&child) => Handle::borrowed(child),
                None => Handle::invalid(),
            },
            _ => Handle::invalid(),
        }
    }

    /// Borrowed handle to an array element; invalid when the handle is not
    /// an Array or the index is out of range.
    pub fn get_index(&self, handle: &Handle, index: usize) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        match self.data(id) {
            Some(NodeData::Array(children)) => match children.get(index) {
                Some(&child) => Handle::borrowed(child),
                None => Handle::invalid(),
            },
            _ => Handle::invalid(),
        }
    }

    /// Borrowed handle resolved by walking an RFC 6901 pointer from
    /// `handle`; invalid when the pointer is malformed or any segment
    /// fails to resolve. The empty pointer resolves to `handle`'s own node.
    pub fn get_pointer(&self, handle: &Handle, pointer: &str) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        let Ok(tokens) = parse_pointer(pointer) else {
            return Handle::invalid();
        };
        match self.resolve_tokens(id, &tokens) {
            Some(found) => Handle::borrowed(found),
            None => Handle::invalid(),
        }
    }

    /// Element count for arrays, member count for objects, 0 otherwise.
    pub fn len(&self, handle: &Handle) -> usize {
        match self.resolve(handle).and_then(|id| self.data(id)) {
            Some(NodeData::Array(children)) => children.len(),
            Some(NodeData::Object(members)) => members.len(),
            _ => 0,
        }
    }

    /// Structural equality of two subtrees: objects by key set irrespective
    /// of member order, arrays element-wise by position, numbers by value.
    /// False when either handle is invalid.
    pub fn deep_equal(&self, a: &Handle, b: &Handle) -> bool {
        match (self.resolve(a), self.resolve(b)) {
            (Some(x), Some(y)) => self.node_equal(x, y),
            _ => false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Deep copy of a subtree as a fresh owned root. This is the snapshot
    /// affordance for callers who need to restore a tree after a failed
    /// patch application.
    pub fn clone_tree(&mut self, handle: &Handle) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        match self.clone_subtree(id) {
            Some(copy) => Handle::owned(copy),
            None => Handle::invalid(),
        }
    }

    /// Detach an object member as a fresh owned root; invalid when the
    /// container is not an Object or the key is absent.
    pub fn take_member(&mut self, handle: &Handle, key: &str) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        match self.detach_member(id, key) {
            Some(detached) => Handle::owned(detached),
            None => Handle::invalid(),
        }
    }

    /// Detach an array element as a fresh owned root; invalid when the
    /// container is not an Array or the index is out of range.
    pub fn take_index(&mut self, handle: &Handle, index: usize) -> Handle {
        let Some(id) = self.resolve(handle) else {
            return Handle::invalid();
        };
        match self.detach_index(id, index) {
            Some(detached) => Handle::owned(detached),
            None => Handle::invalid(),
        }
    }

    /// Release the subtree behind an owned handle.
    ///
    /// No-op for borrowed or invalid handles, and for a node that sits
    /// inside a container (possible only after
    /// [`Handle::take_ownership`](crate::Handle::take_ownership); the
    /// container keeps owning it). Handles into a released subtree become
    /// invalid.
    pub fn release(&mut self, handle: Handle) {
        if handle.ownership() != Ownership::Owned {
            return;
        }
        let Some(id) = self.resolve(&handle) else {
            return;
        };
        if self.entry(id).and_then(|entry| entry.parent).is_some() {
            return;
        }
        self.free_subtree(id);
    }

    // ── Serialization ─────────────────────────────────────────────────────

    /// Render the subtree as JSON text: compact single-line, or multi-line
    /// indented when `pretty`. `None` for an invalid handle.
    pub fn serialize(&self, handle: &Handle, pretty: bool) -> Option<String> {
        let id = self.resolve(handle)?;
        let value = self.export(id)?;
        if pretty {
            serde_json::to_string_pretty(&value).ok()
        } else {
            serde_json::to_string(&value).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_types() {
        let mut store = NodeStore::new();
        let null = store.create_null();
        let boolean = store.create_bool(true);
        let number = store.create_number(1.5);
        let string = store.create_string("s");
        let array = store.create_array();
        let object = store.create_object();
        assert_eq!(store.type_of(&null), JsonType::Null);
        assert_eq!(store.type_of(&boolean), JsonType::Bool);
        assert_eq!(store.type_of(&number), JsonType::Number);
        assert_eq!(store.type_of(&string), JsonType::String);
        assert_eq!(store.type_of(&array), JsonType::Array);
        assert_eq!(store.type_of(&object), JsonType::Object);
        assert!(store.is_object(&object));
        assert!(!store.is_array(&object));
    }

    #[test]
    fn parse_well_formed() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"a": [1, 2], "b": null}"#);
        assert_eq!(store.type_of(&doc), JsonType::Object);
        assert_eq!(store.len(&doc), 2);
    }

    #[test]
    fn parse_malformed_is_invalid() {
        let mut store = NodeStore::new();
        let doc = store.parse("{broken");
        assert_eq!(store.type_of(&doc), JsonType::Invalid);
        assert!(store.try_parse("{broken").is_err());
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn parse_duplicate_keys_last_wins() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"k": 1, "k": 2}"#);
        let member = store.get_member(&doc, "k");
        assert_eq!(store.get_number(&member, 0.0), 2.0);
        assert_eq!(store.len(&doc), 1);
    }

    #[test]
    fn scalar_accessors_fall_back_to_defaults() {
        let mut store = NodeStore::new();
        let number = store.create_number(2.5);
        assert_eq!(store.get_number(&number, 0.0), 2.5);
        assert!(store.get_bool(&number, true));
        assert_eq!(store.get_string(&number, "fallback"), "fallback");
        assert_eq!(store.get_number(&Handle::invalid(), 9.0), 9.0);
    }

    #[test]
    fn member_and_index_lookups() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"list": [10, 20]}"#);
        let list = store.get_member(&doc, "list");
        assert_eq!(list.ownership(), Ownership::Borrowed);
        let first = store.get_index(&list, 0);
        assert_eq!(store.get_number(&first, 0.0), 10.0);
        assert_eq!(store.type_of(&store.get_index(&list, 2)), JsonType::Invalid);
        assert_eq!(store.type_of(&store.get_member(&doc, "none")), JsonType::Invalid);
        assert_eq!(store.type_of(&store.get_member(&list, "k")), JsonType::Invalid);
    }

    #[test]
    fn pointer_lookups() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"a": {"b": [true]}, "x~y": 1, "u/v": 2}"#);
        assert!(store.get_bool(&store.get_pointer(&doc, "/a/b/0"), false));
        assert_eq!(store.get_number(&store.get_pointer(&doc, "/x~0y"), 0.0), 1.0);
        assert_eq!(store.get_number(&store.get_pointer(&doc, "/u~1v"), 0.0), 2.0);
        assert_eq!(store.type_of(&store.get_pointer(&doc, "/a/c")), JsonType::Invalid);
        assert_eq!(store.type_of(&store.get_pointer(&doc, "a/b")), JsonType::Invalid);
        assert_eq!(store.type_of(&store.get_pointer(&doc, "")), JsonType::Object);
    }

    #[test]
    fn serialize_compact_and_pretty() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"a":1,"b":[true,null]}"#);
        assert_eq!(
            store.serialize(&doc, false).unwrap(),
            r#"{"a":1,"b":[true,null]}"#
        );
        let pretty = store.serialize(&doc, true).unwrap();
        assert!(pretty.contains('\n'));
        let reparsed = store.parse(&pretty);
        assert!(store.deep_equal(&doc, &reparsed));
        assert!(store.serialize(&Handle::invalid(), false).is_none());
    }

    #[test]
    fn integral_numbers_render_without_decimals() {
        let mut store = NodeStore::new();
        let n = store.create_number(25.0);
        assert_eq!(store.serialize(&n, false).unwrap(), "25");
        let f = store.create_number(2.5);
        assert_eq!(store.serialize(&f, false).unwrap(), "2.5");
    }

    #[test]
    fn release_frees_owned_roots() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"[1, 2, 3]"#);
        assert_eq!(store.node_count(), 4);
        store.release(doc);
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn release_of_borrowed_handle_is_noop() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"k": [1]}"#);
        let member = store.get_member(&doc, "k");
        store.release(member);
        assert_eq!(store.len(&doc), 1);
        assert_eq!(store.serialize(&doc, false).unwrap(), r#"{"k":[1]}"#);
    }

    #[test]
    fn release_of_attached_node_is_noop() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"k": 1}"#);
        let mut member = store.get_member(&doc, "k");
        member.take_ownership();
        store.release(member);
        assert_eq!(store.serialize(&doc, false).unwrap(), r#"{"k":1}"#);
    }

    #[test]
    fn handles_into_released_tree_become_invalid() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"k": 1}"#);
        let member = store.get_member(&doc, "k");
        store.release(doc);
        assert_eq!(store.type_of(&member), JsonType::Invalid);
    }

    #[test]
    fn clone_tree_is_independent() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"a": [1, 2]}"#);
        let copy = store.clone_tree(&doc);
        assert!(store.deep_equal(&doc, &copy));
        store.release(doc);
        assert_eq!(store.serialize(&copy, false).unwrap(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn take_member_rehomes() {
        let mut store = NodeStore::new();
        let doc = store.parse(r#"{"a": [1], "b": 2}"#);
        let taken = store.take_member(&doc, "a");
        assert_eq!(taken.ownership(), Ownership::Owned);
        assert_eq!(store.serialize(&doc, false).unwrap(), r#"{"b":2}"#);
        assert_eq!(store.serialize(&taken, false).unwrap(), "[1]");
        store.release(taken);
        let taken_again = store.take_member(&doc, "a");
        assert_eq!(store.type_of(&taken_again), JsonType::Invalid);
    }

    #[test]
    fn deep_equal_across_trees() {
        let mut store = NodeStore::new();
        let a = store.parse(r#"{"x": 1, "y": [true]}"#);
        let b = store.parse(r#"{"y": [true], "x": 1}"#);
        let c = store.parse(r#"{"x": 1, "y": [false]}"#);
        assert!(store.deep_equal(&a, &b));
        assert!(!store.deep_equal(&a, &c));
        assert!(!store.deep_equal(&a, &Handle::invalid()));
    }
}
