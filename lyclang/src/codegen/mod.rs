//! The `codegen` module lowers a parsed LYC syntax tree to plain CSS text.
//!
//! It owns the typed syntax tree, the recursive generation walk with its
//! threaded environment, and the purely textual back half of the pipeline
//! (rule merging, document assembly, minification).

pub mod ast;
pub use ast::{Atom, Operator, Property, RuleItem, Selector, Stmt, StyleRule, Stylesheet, Value};

/// Recursive tree walk threading the variable environment, selector prefix,
/// media query and layer context, and collecting the deferred output.
pub mod generator;
pub use generator::generate;

/// Variable bindings, scope lookup and the mixin registry.
pub mod scope;

/// Pure resolution of value expressions, including the contained
/// two-operand arithmetic evaluator.
pub mod value;

/// Root-stream rule merging and declaration deduplication.
pub mod optimize;

/// Fixed-order document assembly.
pub mod assemble;

/// Text-level minification of the assembled document.
pub mod minify;
