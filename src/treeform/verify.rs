//! Tree verification against a schema
//!
//! [verify_tree] is the orchestrator: it checks the file extension, checks
//! the header node, then walks every remaining node of the document against
//! the schema's named definitions. All three results fold into one verdict,
//! and every mismatch is logged to the trail. A failing extension or header
//! does not stop the structural walk, so a single pass reports everything.
//!
//! The structural walk is an explicit work-list rather than native
//! recursion: each frame is a tree position (a node, or the absence of one)
//! plus the ordered candidate definitions legal there. Candidates are tried
//! in declaration order and the first content match is bound as the node's
//! type; its child and next-sibling sets then supply the candidate lists for
//! the adjacent frames. There is deliberately no retry: once a node is bound,
//! a later failure below it never re-opens the choice.

use super::diagnostics::{Trail, Verification};
use super::format_node::{FormatNode, NameRef};
use super::header;
use super::node::{NodeId, NodeTree};
use super::schema::Schema;

/// Verify a loaded tree against a schema.
///
/// `tag` is the owning format's identifier (e.g. `GHDR`), used to check the
/// header. Returns the verdict and the full diagnostic trail; verification
/// never fails with an error, whatever the tree looks like.
pub fn verify_tree(tag: &str, schema: &Schema, tree: &NodeTree, filepath: &str) -> Verification {
    let mut trail = Trail::new();
    trail.info(format!("Starting verification of file {}...", filepath));

    let extension_ok = check_extension(&mut trail, schema, filepath);

    let root = tree.root();
    let header_ok = header::verify_head_node(&mut trail, root.map(|id| &tree[id]), tag, schema);

    // the header's next sibling is the first node the schema governs
    let first = root.and_then(|id| tree[id].next_sibling());
    let nodes_ok = verify_chain(&mut trail, schema, tree, first, schema.head_candidates());

    let passed = extension_ok && header_ok && nodes_ok;
    if passed {
        trail.info(format!(
            "File: {} matches schema {}!",
            filepath,
            schema.version_label()
        ));
    } else {
        trail.warn(format!(
            "File: {} does not match schema {}!",
            filepath,
            schema.version_label()
        ));
    }
    Verification::new(passed, trail)
}

/// Extension of a file path: final path segment, then everything from the
/// first dot. A name with no dot has no extension.
fn file_extension(filepath: &str) -> &str {
    let filename = filepath.rsplit(['/', '\\']).next().unwrap_or(filepath);
    match filename.find('.') {
        Some(dot) => &filename[dot..],
        None => "",
    }
}

fn check_extension(trail: &mut Trail, schema: &Schema, filepath: &str) -> bool {
    let extension = file_extension(filepath);
    if extension.eq_ignore_ascii_case(schema.file_extension()) {
        return true;
    }
    let shown = if extension.is_empty() { "(none)" } else { extension };
    trail.error(format!(
        "File extension doesn't match!\n* Expected: {}, but was: {}!",
        schema.file_extension(),
        shown
    ));
    false
}

/// Walk a node chain and everything below it with an explicit stack.
///
/// Each frame pairs a position (`None` when no node is present there) with
/// the candidates legal at that position. Frames for a bound node's child
/// chain are pushed above the frame for its sibling chain, so diagnostics
/// come out in depth-first, children-first order.
fn verify_chain<'s>(
    trail: &mut Trail,
    schema: &'s Schema,
    tree: &NodeTree,
    start: Option<NodeId>,
    candidates: &'s [NameRef],
) -> bool {
    let mut all_good = true;
    let mut stack: Vec<(Option<NodeId>, &'s [NameRef])> = vec![(start, candidates)];

    while let Some((position, candidates)) = stack.pop() {
        let id = match position {
            Some(id) => id,
            None => {
                if !candidates.contains(&NameRef::Absent) {
                    trail.warn(format!(
                        "Required node missing!\n* Expected one of: {}!",
                        name_list(candidates)
                    ));
                    all_good = false;
                }
                continue;
            }
        };

        let node = &tree[id];
        let mut bound: Option<&FormatNode> = None;
        for candidate in candidates {
            let name = match candidate {
                NameRef::Named(name) => name,
                // sentinels are not matchable definitions
                _ => continue,
            };
            let format = match schema.node(name) {
                Some(format) => format,
                None => continue,
            };
            if format.matches(node) {
                bound = Some(format);
                break;
            }
            let part = if format.matches_title(&node.title) {
                "data"
            } else {
                "title"
            };
            trail.debug(format!(
                "Node does not match the {} format node ({} mismatch)!",
                name, part
            ));
        }

        match bound {
            None => {
                trail.warn(format!("Node could not be identified!\n* Node: {}", node));
                // nothing bound means nothing to govern this node's subtree;
                // pending frames elsewhere still run
                all_good = false;
            }
            Some(format) => {
                trail.trace(format!(
                    "This was a good node!\n* Format: {}\n* Actual: {}",
                    format.name(),
                    node
                ));
                stack.push((node.next_sibling(), format.next_sibling_names()));
                stack.push((node.first_child(), format.child_names()));
            }
        }
    }

    all_good
}

fn name_list(names: &[NameRef]) -> String {
    let rendered: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    rendered.join(", ")
}
