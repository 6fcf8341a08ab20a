//! JSON Pointer (RFC 6901) path utilities.
//!
//! String-level helpers for the pointer syntax used to address nodes in a
//! JSON tree: token escaping, pointer parsing and formatting, and array
//! index token validation. Resolving a pointer against a document lives
//! with the document type; this crate never touches one.
//!
//! # Example
//!
//! ```
//! use json_tree_pointer::{parse_pointer, format_pointer};
//!
//! let tokens = parse_pointer("/users/0/name").unwrap();
//! assert_eq!(tokens, vec!["users", "0", "name"]);
//! assert_eq!(format_pointer(&tokens), "/users/0/name");
//! ```

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("POINTER_INVALID")]
    Invalid,
}

/// Unescape a single pointer token.
///
/// Per RFC 6901, `~1` becomes `/` and `~0` becomes `~`.
///
/// # Example
///
/// ```
/// use json_tree_pointer::unescape_token;
///
/// assert_eq!(unescape_token("a~0b"), "a~b");
/// assert_eq!(unescape_token("c~1d"), "c/d");
/// ```
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    // ~1 before ~0, otherwise "~01" would decode to "/"
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a single pointer token.
///
/// Per RFC 6901, `~` becomes `~0` and `/` becomes `~1`.
///
/// # Example
///
/// ```
/// use json_tree_pointer::escape_token;
///
/// assert_eq!(escape_token("a~b"), "a~0b");
/// assert_eq!(escape_token("c/d"), "c~1d");
/// ```
pub fn escape_token(token: &str) -> String {
    if !token.contains('~') && !token.contains('/') {
        return token.to_string();
    }
    // ~ before /, otherwise "/" would double-escape to "~01"
    token.replace('~', "~0").replace('/', "~1")
}

/// Parse a pointer string into unescaped tokens.
///
/// The empty string is the root pointer (no tokens). Any other pointer
/// must start with `/`; each `/`-separated token is unescaped.
///
/// # Example
///
/// ```
/// use json_tree_pointer::parse_pointer;
///
/// assert_eq!(parse_pointer("").unwrap(), Vec::<String>::new());
/// assert_eq!(parse_pointer("/").unwrap(), vec![""]);
/// assert_eq!(parse_pointer("/a~0b/c~1d"), Ok(vec!["a~b".to_string(), "c/d".to_string()]));
/// assert!(parse_pointer("name").is_err());
/// ```
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::Invalid);
    }
    Ok(pointer[1..].split('/').map(unescape_token).collect())
}

/// Format tokens back into a pointer string.
///
/// The root (no tokens) formats as the empty string.
///
/// # Example
///
/// ```
/// use json_tree_pointer::format_pointer;
///
/// assert_eq!(format_pointer(&[]), "");
/// assert_eq!(format_pointer(&["a~b".to_string(), "c/d".to_string()]), "/a~0b/c~1d");
/// ```
pub fn format_pointer(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_token(token));
    }
    out
}

/// Whether a token is a valid array index: ASCII digits, no leading zero
/// (except `"0"` itself), no sign.
///
/// # Example
///
/// ```
/// use json_tree_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("42"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}
