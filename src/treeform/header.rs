//! The file header node
//!
//! Every treeform file opens with one mandatory header node that identifies
//! the format rather than carrying document content. Its shape is fixed
//! across all formats and schema versions:
//!
//! ```text
//! title:  TreeFormat
//! data:   <format tag>:<version ordinal>     e.g.  GHDR:1
//! level:  0
//! ```
//!
//! Schemas never define the header themselves; definitions that may follow
//! it reference it through the [NameRef::Header](super::format_node::NameRef)
//! sentinel in their previous-sibling set.
//!
//! A malformed or mismatching header is a verification failure like any
//! other: it is logged and fails the file, but it never raises an error and
//! never stops the rest of the walk.

use super::diagnostics::Trail;
use super::node::Node;
use super::schema::Schema;

/// Fixed title of the header node
pub const HEAD_TITLE: &str = "TreeFormat";

/// The `(level, title, data)` record of a conforming header for the given
/// format tag and schema, as an authoring tool would write it.
pub fn head_record(tag: &str, schema: &Schema) -> (u32, String, String) {
    (
        0,
        HEAD_TITLE.to_string(),
        format!("{}:{}", tag, schema.version_ordinal()),
    )
}

/// Check the header node against the expected format tag and schema version.
///
/// All three checks (marker title, tag, ordinal) run and log independently
/// so one pass reports everything that is wrong with the header.
pub(crate) fn verify_head_node(
    trail: &mut Trail,
    node: Option<&Node>,
    tag: &str,
    schema: &Schema,
) -> bool {
    let node = match node {
        Some(node) => node,
        None => {
            trail.error("File is missing the TreeFormat header node!");
            return false;
        }
    };

    let mut good = true;

    if node.title != HEAD_TITLE {
        trail.error(format!(
            "Header title doesn't match!\n* Expected: {}, but was: {}!",
            HEAD_TITLE, node.title
        ));
        good = false;
    }

    match node.data.split_once(':') {
        None => {
            trail.error(format!(
                "Header data is malformed!\n* Expected: {}:{}, but was: {}!",
                tag,
                schema.version_ordinal(),
                node.data
            ));
            good = false;
        }
        Some((file_tag, file_ordinal)) => {
            if file_tag != tag {
                trail.error(format!(
                    "Format tag doesn't match!\n* Expected: {}, but was: {}!",
                    tag, file_tag
                ));
                good = false;
            }
            // a non-numeric ordinal is just another mismatch
            if file_ordinal.parse::<u32>() != Ok(schema.version_ordinal()) {
                trail.error(format!(
                    "Format version doesn't match!\n* Expected: {}, but was: {}!",
                    schema.version_ordinal(),
                    file_ordinal
                ));
                good = false;
            }
        }
    }

    if good {
        trail.trace(format!(
            "Header matches the {} format, version ordinal {}",
            tag,
            schema.version_ordinal()
        ));
    }
    good
}
