//! # treeform
//!
//! Schema verification for the treeform family of node-tree file formats.
//!
//! A treeform file is a flat sequence of leveled `title:data` records that a
//! loader assembles into a tree of nodes. Each concrete format (identified by
//! a short tag such as `GHDR`) declares one or more versioned schemas: named
//! node definitions with content patterns and allowed structural neighbors.
//! This crate checks a loaded tree against such a schema and reports a
//! verdict together with a full diagnostic trail.
//!
//! The crate does not read files or parse raw bytes; building the node tree
//! is the loader's job. See [treeform::node] for the tree model and the
//! record-based builder, and [treeform::verify] for the verification entry
//! points.

pub mod treeform;

pub use treeform::catalog::{FileFormat, FormatError, FormatSpec};
pub use treeform::diagnostics::{Diagnostic, Level, Trail, Verification};
pub use treeform::format_node::{FormatNode, FormatNodeBuilder, NameRef};
pub use treeform::header::{head_record, HEAD_TITLE};
pub use treeform::node::{Node, NodeId, NodeTree, TreeError};
pub use treeform::pattern::{ContentPattern, PatternError};
pub use treeform::schema::{Schema, SchemaError};
pub use treeform::verify::verify_tree;
