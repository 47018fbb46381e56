//! The parsed node tree
//!
//! A loaded treeform document is a tree of nodes, each carrying a title
//! string, a data string and a nesting level. On disk the document is a flat
//! sequence of leveled `title:data` records; the loader tokenizes the raw
//! bytes into those records and this module assembles them into a tree.
//!
//! The tree is arena-backed: [NodeTree] owns every node and the links between
//! nodes are [NodeId] indices. Each node links forward to its first child and
//! its next sibling (the chains the verifier walks) and backward to its
//! parent and previous sibling. The back-links are maintained for lookup by
//! whoever consumes the tree; the verifier never reads them, and their
//! consistency is the builder's responsibility.
//!
//! The verification core treats a finished tree as read-only.

use serde::Serialize;
use std::fmt;
use std::ops::Index;

/// Handle to one node inside a [NodeTree]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(u32);

/// One node of a loaded document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Title text of the record
    pub title: String,
    /// Data text of the record (empty is a value, not an absence)
    pub data: String,
    /// Nesting depth as parsed
    pub level: u32,
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
}

impl Node {
    /// Parent node, if any. Back-link, lookup only.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Previous sibling, if any. Back-link, lookup only.
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    /// Next node in sibling order
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// First child node
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }
}

impl fmt::Display for Node {
    /// Renders the flat record form, `title:data`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.title, self.data)
    }
}

/// Errors raised while assembling a tree from records
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    /// The first record of a document must sit at level 0
    RootLevel(u32),
    /// A record is nested more than one level below its predecessor
    LevelJump { index: usize, from: u32, to: u32 },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::RootLevel(level) => {
                write!(f, "First record must be at level 0, but was at level {}", level)
            }
            TreeError::LevelJump { index, from, to } => write!(
                f,
                "Record {} jumps from level {} to level {}; children may only nest one level deeper",
                index, from, to
            ),
        }
    }
}

impl std::error::Error for TreeError {}

/// Arena holding every node of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl NodeTree {
    /// An empty tree with no nodes
    pub fn new() -> Self {
        NodeTree::default()
    }

    /// Assemble a tree from the flat `(level, title, data)` record sequence
    /// a loader produces.
    ///
    /// Nesting is derived from the level numbers: a record one level deeper
    /// than its predecessor becomes that node's first child, a record at an
    /// already-open level becomes the next sibling of the most recent node at
    /// that level. All four links (parent, previous sibling, next sibling,
    /// first child) are established here, which is what lets the rest of the
    /// crate assume they are consistent.
    pub fn from_records(records: &[(u32, &str, &str)]) -> Result<NodeTree, TreeError> {
        let mut tree = NodeTree::new();
        // ancestry[l] is the most recent node at level l on the current path
        let mut ancestry: Vec<NodeId> = Vec::new();

        for (index, &(level, title, data)) in records.iter().enumerate() {
            if index == 0 && level != 0 {
                return Err(TreeError::RootLevel(level));
            }
            let depth = ancestry.len() as u32;
            if level > depth {
                let from = if index == 0 { 0 } else { records[index - 1].0 };
                return Err(TreeError::LevelJump {
                    index,
                    from,
                    to: level,
                });
            }

            let id = NodeId(tree.nodes.len() as u32);
            let mut node = Node {
                title: title.to_string(),
                data: data.to_string(),
                level,
                parent: None,
                prev_sibling: None,
                next_sibling: None,
                first_child: None,
            };

            if level == depth {
                // first node at this level under the current ancestor
                if level > 0 {
                    let parent = ancestry[level as usize - 1];
                    node.parent = Some(parent);
                    tree.nodes[parent.0 as usize].first_child = Some(id);
                }
                ancestry.push(id);
            } else {
                // sibling of the most recent node at this level
                let prev = ancestry[level as usize];
                node.prev_sibling = Some(prev);
                if level > 0 {
                    node.parent = Some(ancestry[level as usize - 1]);
                }
                tree.nodes[prev.0 as usize].next_sibling = Some(id);
                ancestry.truncate(level as usize);
                ancestry.push(id);
            }

            tree.nodes.push(node);
        }

        tree.root = if tree.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        };
        Ok(tree)
    }

    /// The first node of the document
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node, `None` for a foreign or stale id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flatten the tree back into loader records, in document order.
    ///
    /// Inverse of [NodeTree::from_records] for well-formed trees.
    pub fn records(&self) -> Vec<(u32, String, String)> {
        let mut records = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            let node = &self[id];
            records.push((node.level, node.title.clone(), node.data.clone()));
            // sibling below child so the child chain is emitted first
            if let Some(sibling) = node.next_sibling {
                stack.push(sibling);
            }
            if let Some(child) = node.first_child {
                stack.push(child);
            }
        }
        records
    }
}

impl Index<NodeId> for NodeTree {
    type Output = Node;

    /// Panics on an id from a different tree, like any arena index
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}
