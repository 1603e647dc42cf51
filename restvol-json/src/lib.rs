//! JSON response extraction for the REST VOL connector.
//!
//! Every REST response the connector handles is a JSON document from which
//! one operation needs a handful of values: an object identifier, a link
//! class, an attribute count, an `hrefs` array. Rather than a bespoke parser
//! per operation, callers describe *where* values live with [`KeyPath`]s and
//! read them through the [`Lookup`] trait, which enforces the expected JSON
//! type at each step.
//!
//! ```text
//! raw body ──► ParseTree ──► callback(&tree, &mut out) ──► committed out
//!                              │
//!                              └── lookup(KeyPath, JsonType) ...
//! ```
//!
//! [`dispatch`] stages the callback's writes in a fresh value and only
//! commits them to the caller's output when the whole callback succeeds, so
//! a failed extraction never leaves a half-filled structure behind.

mod error;
mod json_type;
mod key_path;
mod tree;

pub use error::{JsonError, JsonResult};
pub use json_type::JsonType;
pub use key_path::{KeyPath, Segment};
pub use tree::{Lookup, Node, ParseTree};

use serde_json::Value;
use tracing::trace;

/// Types that know how to pull themselves out of a parsed response.
pub trait Extract: Sized {
    fn extract(tree: &ParseTree) -> JsonResult<Self>;
}

/// Parses a raw response body.
pub fn parse(document: &[u8]) -> JsonResult<ParseTree> {
    ParseTree::parse(document)
}

/// Looks up a single typed value in a parsed document.
pub fn lookup<'t>(tree: &'t ParseTree, path: &KeyPath, expected: JsonType) -> JsonResult<&'t Value> {
    tree.lookup(path, expected)
}

/// Parses `document` once and hands the tree to `callback`, which fills
/// `out` through its own lookups.
///
/// The callback writes into a default-initialised scratch value; `out` is
/// replaced only if the callback returns `Ok`. On failure `out` is left
/// exactly as the caller passed it.
pub fn dispatch<T, F>(document: &[u8], callback: F, out: &mut T) -> JsonResult<()>
where
    T: Default,
    F: FnOnce(&ParseTree, &mut T) -> JsonResult<()>,
{
    let tree = parse(document)?;
    let mut staged = T::default();
    callback(&tree, &mut staged)?;
    *out = staged;
    trace!("JSON extraction committed");
    Ok(())
}

/// Parses `document` and extracts a `T` from it.
pub fn extract<T: Extract>(document: &[u8]) -> JsonResult<T> {
    let tree = parse(document)?;
    T::extract(&tree)
}
