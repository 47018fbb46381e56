//! End-to-end verification tests against a GHDR-style catalog
//!
//! The catalog mirrors a real consumer: a `head` node carrying the file
//! title, followed by a repeating chain of `title` nodes whose data names an
//! image file and one or more four-number regions.

use treeform::{verify_tree, FileFormat, Level, NodeTree, Schema};

fn ghdr() -> FileFormat {
    FileFormat::from_yaml_str(
        r#"
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
"#,
    )
    .unwrap()
}

fn schema(format: &FileFormat) -> &Schema {
    format.schema("Version 1.0").unwrap()
}

fn game_records() -> Vec<(u32, &'static str, &'static str)> {
    vec![
        (0, "TreeFormat", "GHDR:1"),
        (0, "My Game", ""),
        (1, "Main Menu", "bg.png[10,20,300,200]"),
        (1, "Options", "menu.png[0,0,100,50]"),
    ]
}

#[test]
fn conformant_file_verifies() {
    let format = ghdr();
    let tree = NodeTree::from_records(&game_records()).unwrap();
    let verification = format.verify("Version 1.0", &tree, "saves/1959.ghdr").unwrap();
    assert!(verification.passed(), "{}", verification.trail().render());
    assert_eq!(verification.trail().count(Level::Error), 0);
    assert_eq!(verification.trail().count(Level::Warn), 0);
}

#[test]
fn single_mutated_data_field_fails_and_is_pinpointed() {
    let format = ghdr();
    let mut records = game_records();
    // drop one of the four required region numbers on the second title
    records[3].2 = "menu.png[0,0,100]";
    let tree = NodeTree::from_records(&records).unwrap();
    let verification = format.verify("Version 1.0", &tree, "saves/1959.ghdr").unwrap();
    assert!(!verification.passed());
    assert!(verification
        .trail()
        .messages_at(Level::Warn)
        .any(|m| m.contains("could not be identified") && m.contains("Options:menu.png[0,0,100]")));
}

#[test]
fn mutated_head_data_fails() {
    let format = ghdr();
    let mut records = game_records();
    // head's data pattern is the empty template
    records[1].2 = "unexpected data";
    let tree = NodeTree::from_records(&records).unwrap();
    let verification = format.verify("Version 1.0", &tree, "saves/1959.ghdr").unwrap();
    assert!(!verification.passed());
}

#[test]
fn extension_check_is_case_insensitive() {
    let format = ghdr();
    let tree = NodeTree::from_records(&game_records()).unwrap();
    for path in ["1959.ghdr", "1959.GHDR", "1959.gHdR"] {
        let verification = format.verify("Version 1.0", &tree, path).unwrap();
        assert!(verification.passed(), "{}", path);
    }
}

#[test]
fn wrong_extension_fails_without_stopping_the_walk() {
    let format = ghdr();
    let tree = NodeTree::from_records(&game_records()).unwrap();
    let verification = format.verify("Version 1.0", &tree, "1959.sav").unwrap();
    assert!(!verification.passed());
    let rendered = verification.trail().render();
    assert!(rendered.contains("File extension doesn't match!"));
    // header and node checks still produced their trace entries
    assert!(rendered.contains("Header matches the GHDR format"));
    assert!(rendered.contains("This was a good node!"));
}

#[test]
fn wrong_header_version_fails() {
    let format = ghdr();
    let mut records = game_records();
    records[0].2 = "GHDR:2";
    let tree = NodeTree::from_records(&records).unwrap();
    let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
    assert!(!verification.passed());
    assert!(verification
        .trail()
        .render()
        .contains("Format version doesn't match!"));
}

#[test]
fn title_chain_may_repeat_or_end() {
    let format = ghdr();
    // a single title and a long chain are both fine
    for extra in [0, 5] {
        let mut records = vec![
            (0u32, "TreeFormat".to_string(), "GHDR:1".to_string()),
            (0, "My Game".to_string(), String::new()),
            (1, "Main Menu".to_string(), "bg.png[10,20,300,200]".to_string()),
        ];
        for i in 0..extra {
            records.push((
                1,
                format!("Screen {}", i),
                format!("screen{}.png[0,0,640,480]", i),
            ));
        }
        let flat: Vec<(u32, &str, &str)> = records
            .iter()
            .map(|(l, t, d)| (*l, t.as_str(), d.as_str()))
            .collect();
        let tree = NodeTree::from_records(&flat).unwrap();
        let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
        assert!(verification.passed(), "{}", verification.trail().render());
    }
}

#[test]
fn head_without_title_child_fails() {
    let format = ghdr();
    let tree =
        NodeTree::from_records(&[(0, "TreeFormat", "GHDR:1"), (0, "My Game", "")]).unwrap();
    let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
    assert!(!verification.passed());
    assert!(verification
        .trail()
        .render()
        .contains("Required node missing!"));
}

#[test]
fn multiple_regions_on_one_title_are_accepted() {
    let format = ghdr();
    let mut records = game_records();
    records[2].2 = "bg.png[10,20,300,200],[0,0,50,50],[5,5,10,10]";
    let tree = NodeTree::from_records(&records).unwrap();
    let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
    assert!(verification.passed(), "{}", verification.trail().render());
}

#[test]
fn verdict_and_trail_are_idempotent_across_runs() {
    let format = ghdr();
    let tree = NodeTree::from_records(&game_records()).unwrap();
    let first = verify_tree(format.tag(), schema(&format), &tree, "1959.ghdr");
    let second = verify_tree(format.tag(), schema(&format), &tree, "1959.ghdr");
    assert_eq!(first, second);
}

#[test]
fn trail_serializes_for_tooling() {
    let format = ghdr();
    let tree = NodeTree::from_records(&game_records()).unwrap();
    let verification = format.verify("Version 1.0", &tree, "1959.ghdr").unwrap();
    let json = serde_json::to_value(&verification).unwrap();
    assert_eq!(json["passed"], true);
    assert!(json["trail"]["entries"].as_array().unwrap().len() >= 2);
}
