//! json-tree — mutable JSON document trees with ownership-tagged handles,
//! structural diff, and patch.
//!
//! Nodes live in a [`NodeStore`] arena; callers work through [`Handle`]s,
//! thin references tagged [`Owned`](Ownership::Owned) or
//! [`Borrowed`](Ownership::Borrowed). Constructors and parsing hand out
//! owned roots; looking inside a container hands out borrowed views;
//! attaching a value into a container consumes its handle and transfers
//! the node. [`NodeStore::diff`] and [`NodeStore::apply_patch`] speak
//! RFC 6902 edit operations addressed by RFC 6901 pointers.
//!
//! # Example
//!
//! ```
//! use json_tree::NodeStore;
//!
//! let mut store = NodeStore::new();
//! let person = store.create_object();
//! store
//!     .set_string(&person, "name", "Alice")
//!     .set_number(&person, "age", 25.0)
//!     .set_bool(&person, "active", true);
//! assert_eq!(
//!     store.serialize(&person, false).unwrap(),
//!     r#"{"name":"Alice","age":25,"active":true}"#
//! );
//!
//! let name = store.get_pointer(&person, "/name");
//! assert_eq!(store.get_string(&name, "?"), "Alice");
//!
//! let wanted = store.parse(r#"{"name":"Bob","age":30,"active":true}"#);
//! let patch = store.diff(&person, &wanted);
//! store.apply_patch(&person, &patch).unwrap();
//! assert!(store.deep_equal(&person, &wanted));
//! ```

pub mod handle;
pub mod mutate;
pub mod patch;
pub mod store;
pub mod value;

pub use handle::{Handle, JsonType, Ownership};
pub use patch::PatchError;
pub use store::NodeStore;
pub use value::ParseError;
