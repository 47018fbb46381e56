//! Versioned schemas
//!
//! A [Schema] bundles everything one version of a file format declares: the
//! human-readable version label, the monotonically increasing version
//! ordinal, the required file extension and the full set of
//! [FormatNode](super::format_node::FormatNode) definitions. Schemas are
//! immutable once constructed and safe to share across threads.
//!
//! Authoring defects (duplicate definition names, references to definitions
//! that don't exist, the header sentinel outside a previous-sibling set, a
//! malformed extension or pattern template) are rejected here, at
//! construction time. A file verification can therefore assume every named
//! reference resolves and never reports authoring problems as file problems.

use super::format_node::{FormatNode, NameRef};
use super::pattern::PatternError;
use std::collections::HashMap;
use std::fmt;

/// Schema and definition authoring errors
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A definition was built without a name
    MissingName,
    /// Definition names are `[A-Za-z][A-Za-z0-9_-]*`
    InvalidName(String),
    /// A title or data template failed to parse
    Pattern { node: String, error: PatternError },
    /// File extensions are non-empty and carry the leading dot
    InvalidExtension(String),
    /// Two definitions share a name
    DuplicateNode(String),
    /// A relation entry references a definition the schema doesn't have
    DanglingReference {
        node: String,
        relation: &'static str,
        target: String,
    },
    /// The header sentinel is only meaningful as a previous sibling
    HeaderNotAllowed {
        node: String,
        relation: &'static str,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingName => write!(f, "Format node needs a name"),
            SchemaError::InvalidName(name) => {
                write!(f, "Invalid format node name: {:?}", name)
            }
            SchemaError::Pattern { node, error } => {
                write!(f, "Bad pattern on format node {}: {}", node, error)
            }
            SchemaError::InvalidExtension(ext) => {
                write!(f, "Invalid file extension {:?}; expected a leading dot", ext)
            }
            SchemaError::DuplicateNode(name) => {
                write!(f, "Duplicate format node name: {}", name)
            }
            SchemaError::DanglingReference {
                node,
                relation,
                target,
            } => write!(
                f,
                "Format node {} references unknown definition {} as {}",
                node, target, relation
            ),
            SchemaError::HeaderNotAllowed { node, relation } => write!(
                f,
                "Format node {} uses the header sentinel as {}; it is only valid as a previous sibling",
                node, relation
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

/// One version of a file format: extension, ordinal and node definitions
#[derive(Debug, Clone)]
pub struct Schema {
    version_label: String,
    version_ordinal: u32,
    file_extension: String,
    nodes: Vec<FormatNode>,
    index: HashMap<String, usize>,
    head_candidates: Vec<NameRef>,
}

impl Schema {
    /// Validate and assemble a schema.
    ///
    /// Definitions keep their declaration order; that order decides which
    /// candidates are tried first wherever several are legal.
    pub fn new(
        version_label: impl Into<String>,
        version_ordinal: u32,
        file_extension: impl Into<String>,
        nodes: Vec<FormatNode>,
    ) -> Result<Schema, SchemaError> {
        let file_extension = file_extension.into();
        if !file_extension.starts_with('.') || file_extension.len() < 2 {
            return Err(SchemaError::InvalidExtension(file_extension));
        }

        let mut index = HashMap::new();
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.name().to_string(), position).is_some() {
                return Err(SchemaError::DuplicateNode(node.name().to_string()));
            }
        }

        for node in &nodes {
            let relations: [(&'static str, &[NameRef], bool); 4] = [
                ("parent", node.parent_names(), false),
                ("previous sibling", node.prev_sibling_names(), true),
                ("next sibling", node.next_sibling_names(), false),
                ("child", node.child_names(), false),
            ];
            for (relation, names, header_ok) in relations {
                for name in names {
                    match name {
                        NameRef::Absent => {}
                        NameRef::Header => {
                            if !header_ok {
                                return Err(SchemaError::HeaderNotAllowed {
                                    node: node.name().to_string(),
                                    relation,
                                });
                            }
                        }
                        NameRef::Named(target) => {
                            if !index.contains_key(target) {
                                return Err(SchemaError::DanglingReference {
                                    node: node.name().to_string(),
                                    relation,
                                    target: target.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        // The candidate list for the position right after the file header
        let head_candidates = nodes
            .iter()
            .filter(|node| node.prev_sibling_names().contains(&NameRef::Header))
            .map(|node| NameRef::named(node.name()))
            .collect();

        Ok(Schema {
            version_label: version_label.into(),
            version_ordinal,
            file_extension,
            nodes,
            index,
            head_candidates,
        })
    }

    pub fn version_label(&self) -> &str {
        &self.version_label
    }

    pub fn version_ordinal(&self) -> u32 {
        self.version_ordinal
    }

    /// Required file extension, leading dot included. Compared
    /// case-insensitively against actual file names.
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// Definitions in declaration order
    pub fn nodes(&self) -> &[FormatNode] {
        &self.nodes
    }

    /// Look up a definition by name
    pub fn node(&self, name: &str) -> Option<&FormatNode> {
        self.index.get(name).map(|&position| &self.nodes[position])
    }

    /// Definitions legal immediately after the file header, in declaration
    /// order
    pub fn head_candidates(&self) -> &[NameRef] {
        &self.head_candidates
    }
}
