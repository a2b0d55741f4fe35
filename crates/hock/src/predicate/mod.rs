//! Structural comparison of request bodies.
//!
//! Bodies are compared as parsed JSON values rather than as text, so that two
//! payloads that differ only in object key order or whitespace are equal.

mod deep_equals;

pub use deep_equals::{deep_equals, to_structural};
