//! Format node definitions
//!
//! A [FormatNode] declares one named node type of a schema: the content
//! patterns its title and data must satisfy, its nesting level, and the
//! ordered sets of definitions allowed as its parent, previous sibling, next
//! sibling and children. The relation sets drive the tree walk: when a node
//! is bound to a definition, the definition's child and next-sibling sets
//! become the candidate lists for the adjacent positions, tried in
//! declaration order with the first match winning.
//!
//! Relation entries are [NameRef]s rather than bare strings so "absence is
//! valid here" and "comes right after the file header" are variants the
//! compiler forces callers to handle, not magic names.

use super::node::Node;
use super::pattern::ContentPattern;
use super::schema::SchemaError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Definition names must leave room for the spec-file sentinel tokens
static NODE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("node name regex"));

/// One entry of a relation set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameRef {
    /// Absence of a node is itself valid at this position
    Absent,
    /// The schema-independent file header; only meaningful as a previous
    /// sibling, marking a definition as legal right after the header
    Header,
    /// A definition in the same schema
    Named(String),
}

impl NameRef {
    /// Reference to a named definition
    pub fn named(name: impl Into<String>) -> Self {
        NameRef::Named(name.into())
    }

    /// The referenced definition name, for `Named` entries
    pub fn as_named(&self) -> Option<&str> {
        match self {
            NameRef::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRef::Absent => write!(f, "(absent)"),
            NameRef::Header => write!(f, "(header)"),
            NameRef::Named(name) => write!(f, "{}", name),
        }
    }
}

/// One named node type of a schema
#[derive(Debug, Clone)]
pub struct FormatNode {
    name: String,
    title_pattern: ContentPattern,
    data_pattern: ContentPattern,
    level: u32,
    parent_names: Vec<NameRef>,
    prev_sibling_names: Vec<NameRef>,
    next_sibling_names: Vec<NameRef>,
    child_names: Vec<NameRef>,
}

impl FormatNode {
    pub fn builder() -> FormatNodeBuilder {
        FormatNodeBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title_pattern(&self) -> &ContentPattern {
        &self.title_pattern
    }

    pub fn data_pattern(&self) -> &ContentPattern {
        &self.data_pattern
    }

    /// Nesting depth this definition is written for. Informational: reported
    /// in diagnostics, not enforced by the matcher.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn parent_names(&self) -> &[NameRef] {
        &self.parent_names
    }

    pub fn prev_sibling_names(&self) -> &[NameRef] {
        &self.prev_sibling_names
    }

    pub fn next_sibling_names(&self) -> &[NameRef] {
        &self.next_sibling_names
    }

    pub fn child_names(&self) -> &[NameRef] {
        &self.child_names
    }

    /// The single-node matcher: does the node's content satisfy this
    /// definition? Both title and data must match.
    pub fn matches(&self, node: &Node) -> bool {
        self.matches_title(&node.title) && self.matches_data(&node.data)
    }

    pub fn matches_title(&self, title: &str) -> bool {
        self.title_pattern.matches(title)
    }

    pub fn matches_data(&self, data: &str) -> bool {
        self.data_pattern.matches(data)
    }
}

/// Fluent builder for [FormatNode]
///
/// A relation set left untouched defaults to `[Absent]`: a definition that
/// says nothing about, say, its next sibling is one whose chain simply ends
/// there. Definitions that allow neighbors list them explicitly.
///
/// ```text
/// FormatNode::builder()
///     .name("title")
///     .title_pattern("<text>")
///     .data_pattern("<imagefile>[$<#>,<#>,<#>,<#>]")
///     .level(1)
///     .parent_name("head").null_parent()
///     .prev_sibling_name("title").null_prev_sibling()
///     .next_sibling_name("title").null_next_sibling()
///     .build()?
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatNodeBuilder {
    name: Option<String>,
    title_pattern: String,
    data_pattern: String,
    level: u32,
    parent_names: Vec<NameRef>,
    prev_sibling_names: Vec<NameRef>,
    next_sibling_names: Vec<NameRef>,
    child_names: Vec<NameRef>,
}

impl FormatNodeBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Template for the node's title text (§ pattern module)
    pub fn title_pattern(mut self, template: impl Into<String>) -> Self {
        self.title_pattern = template.into();
        self
    }

    /// Template for the node's data text
    pub fn data_pattern(mut self, template: impl Into<String>) -> Self {
        self.data_pattern = template.into();
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Append any entry to the parent set
    pub fn parent(mut self, name: NameRef) -> Self {
        self.parent_names.push(name);
        self
    }

    pub fn parent_name(self, name: impl Into<String>) -> Self {
        self.parent(NameRef::named(name))
    }

    /// Allow this node to have no parent
    pub fn null_parent(self) -> Self {
        self.parent(NameRef::Absent)
    }

    /// Append any entry to the previous-sibling set
    pub fn prev_sibling(mut self, name: NameRef) -> Self {
        self.prev_sibling_names.push(name);
        self
    }

    pub fn prev_sibling_name(self, name: impl Into<String>) -> Self {
        self.prev_sibling(NameRef::named(name))
    }

    pub fn null_prev_sibling(self) -> Self {
        self.prev_sibling(NameRef::Absent)
    }

    /// Mark this definition as legal immediately after the file header
    pub fn head_prev_sibling(self) -> Self {
        self.prev_sibling(NameRef::Header)
    }

    /// Append any entry to the next-sibling set
    pub fn next_sibling(mut self, name: NameRef) -> Self {
        self.next_sibling_names.push(name);
        self
    }

    pub fn next_sibling_name(self, name: impl Into<String>) -> Self {
        self.next_sibling(NameRef::named(name))
    }

    pub fn null_next_sibling(self) -> Self {
        self.next_sibling(NameRef::Absent)
    }

    /// Append any entry to the child set
    pub fn child(mut self, name: NameRef) -> Self {
        self.child_names.push(name);
        self
    }

    pub fn child_name(self, name: impl Into<String>) -> Self {
        self.child(NameRef::named(name))
    }

    pub fn null_child(self) -> Self {
        self.child(NameRef::Absent)
    }

    /// Validate and compile the definition.
    ///
    /// Fails on a missing or ill-formed name and on template syntax errors;
    /// cross-definition checks (dangling references, header placement) run
    /// at schema construction.
    pub fn build(self) -> Result<FormatNode, SchemaError> {
        let name = self.name.ok_or(SchemaError::MissingName)?;
        if !NODE_NAME_RE.is_match(&name) {
            return Err(SchemaError::InvalidName(name));
        }
        let title_pattern = compile_pattern(&name, &self.title_pattern)?;
        let data_pattern = compile_pattern(&name, &self.data_pattern)?;
        Ok(FormatNode {
            name,
            title_pattern,
            data_pattern,
            level: self.level,
            parent_names: defaulted(self.parent_names),
            prev_sibling_names: defaulted(self.prev_sibling_names),
            next_sibling_names: defaulted(self.next_sibling_names),
            child_names: defaulted(self.child_names),
        })
    }
}

fn compile_pattern(name: &str, template: &str) -> Result<ContentPattern, SchemaError> {
    ContentPattern::compile(template).map_err(|error| SchemaError::Pattern {
        node: name.to_string(),
        error,
    })
}

fn defaulted(names: Vec<NameRef>) -> Vec<NameRef> {
    if names.is_empty() {
        vec![NameRef::Absent]
    } else {
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treeform::node::NodeTree;

    fn title_format() -> FormatNode {
        FormatNode::builder()
            .name("title")
            .title_pattern("<text>")
            .data_pattern("<imagefile>[$<#>,<#>,<#>,<#>]")
            .level(1)
            .parent_name("head")
            .null_parent()
            .prev_sibling_name("title")
            .null_prev_sibling()
            .next_sibling_name("title")
            .null_next_sibling()
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_collects_relations_in_order() {
        let format = title_format();
        assert_eq!(
            format.prev_sibling_names(),
            &[NameRef::named("title"), NameRef::Absent]
        );
        assert_eq!(format.child_names(), &[NameRef::Absent]);
    }

    #[test]
    fn test_unset_relations_default_to_absent() {
        let format = FormatNode::builder()
            .name("leaf")
            .title_pattern("<text>")
            .build()
            .unwrap();
        assert_eq!(format.parent_names(), &[NameRef::Absent]);
        assert_eq!(format.next_sibling_names(), &[NameRef::Absent]);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result = FormatNode::builder().title_pattern("<text>").build();
        assert!(matches!(result, Err(SchemaError::MissingName)));
    }

    #[test]
    fn test_reserved_name_shapes_are_rejected() {
        for name in ["@head", "@null", "", "1abc", "has space"] {
            let result = FormatNode::builder().name(name).build();
            assert!(matches!(result, Err(SchemaError::InvalidName(_))), "{}", name);
        }
    }

    #[test]
    fn test_bad_template_is_an_authoring_error() {
        let result = FormatNode::builder()
            .name("broken")
            .data_pattern("<unclosed")
            .build();
        assert!(matches!(result, Err(SchemaError::Pattern { .. })));
    }

    #[test]
    fn test_matches_checks_both_title_and_data() {
        let format = title_format();
        let tree = NodeTree::from_records(&[
            (0, "Main Menu", "bg.png[10,20,300,200]"),
            (0, "Options", "menu.png[0,0,100]"),
            (0, "", "bg.png[1,2,3,4]"),
        ])
        .unwrap();
        let root = tree.root().unwrap();
        let good = &tree[root];
        let bad_data = &tree[good.next_sibling().unwrap()];
        let bad_title = &tree[bad_data.next_sibling().unwrap()];

        assert!(format.matches(good));
        assert!(!format.matches(bad_data));
        assert!(format.matches_title(&bad_data.title));
        assert!(!format.matches_data(&bad_data.data));
        assert!(!format.matches(bad_title));
    }
}
