//! Format catalogs
//!
//! A [FileFormat] is one concrete file format: a short tag (e.g. `GHDR`) and
//! its versioned schemas, keyed by version label. Catalogs are built once at
//! startup and read-only afterwards; callers pick a schema by label and hand
//! it to the verifier.
//!
//! Catalogs can be assembled in code from built
//! [FormatNode](super::format_node::FormatNode)s, or declared as data and
//! loaded with [FileFormat::from_yaml_str] / [FileFormat::from_json_str]:
//!
//! ```text
//! tag: GHDR
//! schemas:
//!   - version: "Version 1.0"
//!     ordinal: 1
//!     extension: .ghdr
//!     nodes:
//!       - name: head
//!         title: "<fileTitle>"
//!         level: 0
//!         children: [title]
//!         prev_siblings: ["@head"]
//!       - name: title
//!         title: "<text>"
//!         data: "<imagefile>[$<#>,<#>,<#>,<#>]"
//!         level: 1
//!         parents: [head, "@null"]
//!         prev_siblings: [title, "@null"]
//!         next_siblings: [title, "@null"]
//! ```
//!
//! In spec files the reserved tokens `"@null"` and `"@head"` stand for the
//! absence sentinel and the header sentinel. Definition names may not start
//! with `@`, so the tokens can never shadow a real definition.

use super::diagnostics::Verification;
use super::format_node::{FormatNode, FormatNodeBuilder, NameRef};
use super::node::NodeTree;
use super::schema::{Schema, SchemaError};
use super::verify::verify_tree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Spec-file token for [NameRef::Absent]
pub const NULL_TOKEN: &str = "@null";
/// Spec-file token for [NameRef::Header]
pub const HEAD_TOKEN: &str = "@head";

/// Catalog construction and lookup errors
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Format tags are non-empty and colon-free (the header separator)
    InvalidTag(String),
    /// Two schemas in one catalog share a version label
    DuplicateVersion(String),
    /// Two schemas in one catalog share a version ordinal
    DuplicateOrdinal(u32),
    /// Lookup by a version label the catalog doesn't have
    UnknownVersion(String),
    /// A `@`-token in a spec file that is neither `@null` nor `@head`
    UnknownToken { node: String, token: String },
    /// A schema inside the catalog failed validation
    Schema(SchemaError),
    /// The spec document itself failed to parse
    Parse(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidTag(tag) => write!(f, "Invalid format tag: {:?}", tag),
            FormatError::DuplicateVersion(label) => {
                write!(f, "Duplicate schema version label: {}", label)
            }
            FormatError::DuplicateOrdinal(ordinal) => {
                write!(f, "Duplicate schema version ordinal: {}", ordinal)
            }
            FormatError::UnknownVersion(label) => {
                write!(f, "Unknown schema version label: {}", label)
            }
            FormatError::UnknownToken { node, token } => write!(
                f,
                "Format node {} uses unknown token {}; expected {} or {}",
                node, token, NULL_TOKEN, HEAD_TOKEN
            ),
            FormatError::Schema(err) => write!(f, "Schema error: {}", err),
            FormatError::Parse(msg) => write!(f, "Format spec failed to parse: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<SchemaError> for FormatError {
    fn from(err: SchemaError) -> Self {
        FormatError::Schema(err)
    }
}

/// One concrete file format: tag plus versioned schemas
#[derive(Debug, Clone)]
pub struct FileFormat {
    tag: String,
    schemas: Vec<Schema>,
    index: HashMap<String, usize>,
}

impl FileFormat {
    /// Assemble a catalog from built schemas. Version labels must be unique;
    /// declaration order is kept for listing.
    pub fn new(tag: impl Into<String>, schemas: Vec<Schema>) -> Result<FileFormat, FormatError> {
        let tag = tag.into();
        if tag.is_empty() || tag.contains(':') {
            return Err(FormatError::InvalidTag(tag));
        }
        let mut index = HashMap::new();
        let mut ordinals = HashMap::new();
        for (position, schema) in schemas.iter().enumerate() {
            let label = schema.version_label().to_string();
            if index.insert(label, position).is_some() {
                return Err(FormatError::DuplicateVersion(
                    schema.version_label().to_string(),
                ));
            }
            if ordinals.insert(schema.version_ordinal(), position).is_some() {
                return Err(FormatError::DuplicateOrdinal(schema.version_ordinal()));
            }
        }
        Ok(FileFormat {
            tag,
            schemas,
            index,
        })
    }

    /// The format's short identifier, written into every file header
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up a schema by its version label
    pub fn schema(&self, version_label: &str) -> Option<&Schema> {
        self.index
            .get(version_label)
            .map(|&position| &self.schemas[position])
    }

    /// Version labels in declaration order
    pub fn version_labels(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.version_label())
    }

    /// Verify a tree against the schema with the given version label
    pub fn verify(
        &self,
        version_label: &str,
        tree: &NodeTree,
        filepath: &str,
    ) -> Result<Verification, FormatError> {
        let schema = self
            .schema(version_label)
            .ok_or_else(|| FormatError::UnknownVersion(version_label.to_string()))?;
        Ok(verify_tree(&self.tag, schema, tree, filepath))
    }

    /// Build a catalog from a declarative spec
    pub fn from_spec(spec: FormatSpec) -> Result<FileFormat, FormatError> {
        let mut schemas = Vec::with_capacity(spec.schemas.len());
        for schema_spec in spec.schemas {
            schemas.push(schema_spec.build()?);
        }
        FileFormat::new(spec.tag, schemas)
    }

    /// Build a catalog from a YAML spec document
    pub fn from_yaml_str(source: &str) -> Result<FileFormat, FormatError> {
        let spec: FormatSpec =
            serde_yaml::from_str(source).map_err(|e| FormatError::Parse(e.to_string()))?;
        FileFormat::from_spec(spec)
    }

    /// Build a catalog from a JSON spec document
    pub fn from_json_str(source: &str) -> Result<FileFormat, FormatError> {
        let spec: FormatSpec =
            serde_json::from_str(source).map_err(|e| FormatError::Parse(e.to_string()))?;
        FileFormat::from_spec(spec)
    }
}

/// Declarative form of a whole catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub tag: String,
    pub schemas: Vec<SchemaSpec>,
}

/// Declarative form of one schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub version: String,
    pub ordinal: u32,
    pub extension: String,
    pub nodes: Vec<FormatNodeSpec>,
}

impl SchemaSpec {
    fn build(self) -> Result<Schema, FormatError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for node_spec in self.nodes {
            nodes.push(node_spec.build()?);
        }
        Ok(Schema::new(self.version, self.ordinal, self.extension, nodes)?)
    }
}

/// Declarative form of one format node definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatNodeSpec {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub prev_siblings: Vec<String>,
    #[serde(default)]
    pub next_siblings: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl FormatNodeSpec {
    fn build(self) -> Result<FormatNode, FormatError> {
        let mut builder = FormatNode::builder()
            .name(&self.name)
            .title_pattern(self.title)
            .data_pattern(self.data)
            .level(self.level);
        builder = push_refs(builder, &self.name, &self.parents, FormatNodeBuilder::parent)?;
        builder = push_refs(
            builder,
            &self.name,
            &self.prev_siblings,
            FormatNodeBuilder::prev_sibling,
        )?;
        builder = push_refs(
            builder,
            &self.name,
            &self.next_siblings,
            FormatNodeBuilder::next_sibling,
        )?;
        builder = push_refs(builder, &self.name, &self.children, FormatNodeBuilder::child)?;
        Ok(builder.build()?)
    }
}

fn push_refs(
    mut builder: FormatNodeBuilder,
    node: &str,
    entries: &[String],
    push: fn(FormatNodeBuilder, NameRef) -> FormatNodeBuilder,
) -> Result<FormatNodeBuilder, FormatError> {
    for entry in entries {
        builder = push(builder, parse_name_ref(node, entry)?);
    }
    Ok(builder)
}

/// Resolve one spec-file relation entry to a [NameRef]
fn parse_name_ref(node: &str, entry: &str) -> Result<NameRef, FormatError> {
    match entry {
        NULL_TOKEN => Ok(NameRef::Absent),
        HEAD_TOKEN => Ok(NameRef::Header),
        other if other.starts_with('@') => Err(FormatError::UnknownToken {
            node: node.to_string(),
            token: other.to_string(),
        }),
        other => Ok(NameRef::named(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GHDR_YAML: &str = r#"
tag: GHDR
schemas:
  - version: "Version 1.0"
    ordinal: 1
    extension: .ghdr
    nodes:
      - name: head
        title: "<fileTitle>"
        level: 0
        children: [title]
        prev_siblings: ["@head"]
      - name: title
        title: "<text>"
        data: "<imagefile>[$<#>,<#>,<#>,<#>]"
        level: 1
        parents: [head, "@null"]
        prev_siblings: [title, "@null"]
        next_siblings: [title, "@null"]
"#;

    #[test]
    fn test_yaml_catalog_builds() {
        let format = FileFormat::from_yaml_str(GHDR_YAML).unwrap();
        assert_eq!(format.tag(), "GHDR");
        assert_eq!(
            format.version_labels().collect::<Vec<_>>(),
            vec!["Version 1.0"]
        );
        let schema = format.schema("Version 1.0").unwrap();
        assert_eq!(schema.file_extension(), ".ghdr");
        assert_eq!(schema.head_candidates(), &[NameRef::named("head")]);
        // unset relations defaulted to the absence sentinel
        assert_eq!(
            schema.node("head").unwrap().next_sibling_names(),
            &[NameRef::Absent]
        );
    }

    #[test]
    fn test_yaml_catalog_verifies_a_file() {
        let format = FileFormat::from_yaml_str(GHDR_YAML).unwrap();
        let tree = NodeTree::from_records(&[
            (0, "TreeFormat", "GHDR:1"),
            (0, "My Game", ""),
            (1, "Main Menu", "bg.png[10,20,300,200]"),
        ])
        .unwrap();
        let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
        assert!(verification.passed(), "{}", verification.trail().render());
    }

    #[test]
    fn test_unknown_version_label() {
        let format = FileFormat::from_yaml_str(GHDR_YAML).unwrap();
        let result = format.verify("Version 9.9", &NodeTree::new(), "x.ghdr");
        assert!(matches!(result, Err(FormatError::UnknownVersion(_))));
    }

    #[test]
    fn test_json_spec_round_trip() {
        let format = FileFormat::from_yaml_str(GHDR_YAML).unwrap();
        // re-declare the same catalog as JSON
        let spec: FormatSpec = serde_yaml::from_str(GHDR_YAML).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let from_json = FileFormat::from_json_str(&json).unwrap();
        assert_eq!(from_json.tag(), format.tag());
        assert_eq!(
            from_json.schema("Version 1.0").unwrap().file_extension(),
            ".ghdr"
        );
    }

    #[test]
    fn test_unknown_token_rejected() {
        let yaml = GHDR_YAML.replace("\"@null\"", "\"@nil\"");
        let result = FileFormat::from_yaml_str(&yaml);
        assert!(matches!(
            result,
            Err(FormatError::UnknownToken { token, .. }) if token == "@nil"
        ));
    }

    #[test]
    fn test_misplaced_header_token_rejected() {
        let yaml = GHDR_YAML.replace("children: [title]", "children: [title, \"@head\"]");
        let result = FileFormat::from_yaml_str(&yaml);
        assert!(matches!(
            result,
            Err(FormatError::Schema(SchemaError::HeaderNotAllowed { .. }))
        ));
    }

    #[test]
    fn test_dangling_reference_surfaces() {
        let yaml = GHDR_YAML.replace("children: [title]", "children: [chapter]");
        let result = FileFormat::from_yaml_str(&yaml);
        assert!(matches!(
            result,
            Err(FormatError::Schema(SchemaError::DanglingReference { .. }))
        ));
    }

    #[test]
    fn test_duplicate_version_label_rejected() {
        let schema = || {
            Schema::new(
                "Version 1.0",
                1,
                ".x",
                vec![FormatNode::builder()
                    .name("root")
                    .title_pattern("<text>")
                    .head_prev_sibling()
                    .build()
                    .unwrap()],
            )
            .unwrap()
        };
        let result = FileFormat::new("T", vec![schema(), schema()]);
        assert!(matches!(result, Err(FormatError::DuplicateVersion(_))));
    }

    #[test]
    fn test_duplicate_ordinal_rejected() {
        let schema = |label: &str| {
            Schema::new(
                label,
                1,
                ".x",
                vec![FormatNode::builder()
                    .name("root")
                    .title_pattern("<text>")
                    .head_prev_sibling()
                    .build()
                    .unwrap()],
            )
            .unwrap()
        };
        let result = FileFormat::new("T", vec![schema("Version 1.0"), schema("Version 1.1")]);
        assert!(matches!(result, Err(FormatError::DuplicateOrdinal(1))));
    }

    #[test]
    fn test_invalid_tags_rejected() {
        for tag in ["", "A:B"] {
            let result = FileFormat::new(tag, Vec::new());
            assert!(matches!(result, Err(FormatError::InvalidTag(_))), "{}", tag);
        }
    }

    #[test]
    fn test_catalogs_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileFormat>();
        assert_send_sync::<Schema>();
    }
}
