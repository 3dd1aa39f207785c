//! Integration tests for block classification precedence.

use course_blocks::{
    BlockClassifier, BlockContent, BlockType, ExternalNode, NodeKind, RichText,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn text(s: &str) -> Vec<RichText> {
    vec![RichText::plain(s)]
}

fn callout(text_value: &str, icon: Option<&str>) -> ExternalNode {
    ExternalNode::new(
        "callout-1",
        NodeKind::Callout {
            rich_text: text(text_value),
            icon: icon.map(str::to_string),
        },
    )
}

fn row(cells: &[&str]) -> ExternalNode {
    ExternalNode::new(
        format!("row-{}", cells.join("-")),
        NodeKind::TableRow {
            cells: cells.iter().map(|c| text(c)).collect(),
        },
    )
}

fn table(rows: Vec<ExternalNode>) -> ExternalNode {
    ExternalNode::new(
        "table-1",
        NodeKind::Table {
            has_column_header: true,
        },
    )
    .with_children(rows)
}

fn classify(node: &ExternalNode) -> Option<course_blocks::DomainBlock> {
    BlockClassifier::default().classify(node)
}

#[test]
fn test_timer_parsed_from_text() {
    let block = classify(&callout("Warm-up - 10 minutes", None)).unwrap();

    assert_eq!(block.block_type(), BlockType::SectionTimer);
    assert_eq!(block.duration_mins, Some(10));
    assert_eq!(
        block.content,
        BlockContent::SectionTimer {
            title: "Warm-up".to_string()
        }
    );
}

#[test]
fn test_timer_icon_without_digits_defaults_to_five_minutes() {
    let block = classify(&callout("Break", Some("⏰"))).unwrap();

    assert_eq!(block.block_type(), BlockType::SectionTimer);
    assert_eq!(block.duration_mins, Some(5));
}

#[test]
fn test_timer_icon_with_unrelated_digits_is_not_a_timer() {
    let block = classify(&callout("Step 2", Some("⏱️"))).unwrap();

    assert_eq!(block.block_type(), BlockType::Callout);
    assert_eq!(block.duration_mins, None);
}

#[test]
fn test_duration_text_wins_over_key_point_icon() {
    let block = classify(&callout("Recap 5 mins", Some("🔑"))).unwrap();
    assert_eq!(block.block_type(), BlockType::SectionTimer);
    assert_eq!(block.duration_mins, Some(5));
}

#[rstest]
#[case(Some("🔑"), BlockType::KeyPoint)]
#[case(Some("💡"), BlockType::KeyPoint)]
#[case(Some("🎯"), BlockType::Activity)]
#[case(Some("✏️"), BlockType::Activity)]
#[case(Some("💬"), BlockType::DiscussionPrompt)]
#[case(Some("🗣️"), BlockType::DiscussionPrompt)]
#[case(Some("📎"), BlockType::Callout)]
#[case(None, BlockType::Callout)]
fn test_callout_icon_precedence(#[case] icon: Option<&str>, #[case] expected: BlockType) {
    let block = classify(&callout("Think about the task", icon)).unwrap();
    assert_eq!(block.block_type(), expected);
    assert_eq!(block.duration_mins, None);
}

#[rstest]
#[case(Some("⚠️"), true)]
#[case(Some("🚨"), true)]
#[case(Some("📎"), false)]
#[case(None, false)]
fn test_callout_required_only_for_warning_icons(
    #[case] icon: Option<&str>,
    #[case] required: bool,
) {
    let block = classify(&callout("Wear goggles", icon)).unwrap();
    assert_eq!(block.block_type(), BlockType::Callout);
    assert_eq!(block.is_required, required);
}

#[test]
fn test_materials_table_takes_precedence_over_assessment() {
    let node = table(vec![
        row(&["Item", "Assessment criteria"]),
        row(&["Chisel", "1.1"]),
    ]);

    let block = classify(&node).unwrap();
    assert_eq!(block.block_type(), BlockType::MaterialsTable);
}

#[test]
fn test_materials_table_maps_columns() {
    let node = table(vec![
        row(&["Material", "Quantity", "Notes"]),
        row(&["Pine board", "2", ""]),
        row(&["", "", ""]),
        row(&["Sandpaper", "", "Fine grit"]),
    ]);

    let block = classify(&node).unwrap();
    let BlockContent::MaterialsTable { items } = block.content else {
        panic!("expected materials table");
    };

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Pine board");
    assert_eq!(items[0].quantity.as_deref(), Some("2"));
    assert_eq!(items[0].notes, None);
    assert_eq!(items[1].notes.as_deref(), Some("Fine grit"));
}

#[test]
fn test_assessment_grid_extracts_codes() {
    let node = table(vec![
        row(&["Criteria", "Description", "Evidence"]),
        row(&["1.1, 1.2", "Identify hand tools", "Worksheet"]),
        row(&["2.1", "Use a tenon saw safely", ""]),
    ]);

    let block = classify(&node).unwrap();
    let BlockContent::AssessmentGrid { criteria } = block.content else {
        panic!("expected assessment grid");
    };

    assert_eq!(criteria.len(), 2);
    assert_eq!(criteria[0].codes, vec!["1.1", "1.2"]);
    assert_eq!(criteria[0].description, "Identify hand tools");
    assert_eq!(criteria[0].evidence.as_deref(), Some("Worksheet"));
    assert_eq!(criteria[1].codes, vec!["2.1"]);
    assert_eq!(criteria[1].evidence, None);
}

#[test]
fn test_plain_table_keeps_raw_cells() {
    let node = table(vec![row(&["Day", "Topic"]), row(&["Mon", "Joints"])]);

    let block = classify(&node).unwrap();
    assert_eq!(
        block.content,
        BlockContent::Table {
            headers: vec!["Day".to_string(), "Topic".to_string()],
            rows: vec![vec!["Mon".to_string(), "Joints".to_string()]],
        }
    );
}

#[test]
fn test_todo_becomes_checklist_fragment() {
    let node = ExternalNode::new(
        "todo-1",
        NodeKind::ToDo {
            rich_text: text("Print handouts"),
            checked: true,
        },
    );

    let block = classify(&node).unwrap();
    let BlockContent::Checklist { items } = block.content else {
        panic!("expected checklist");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "Print handouts");
    assert!(items[0].checked);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t")]
fn test_blank_paragraph_is_dropped(#[case] value: &str) {
    let node = ExternalNode::new("p", NodeKind::Paragraph { rich_text: text(value) });
    assert!(classify(&node).is_none());
}

#[test]
fn test_unsupported_and_orphan_rows_are_dropped() {
    assert!(classify(&ExternalNode::new("u", NodeKind::Unsupported)).is_none());
    assert!(classify(&row(&["a"])).is_none());
}

#[test]
fn test_list_items_classify_children() {
    let node = ExternalNode::new(
        "li",
        NodeKind::BulletedListItem {
            rich_text: text("Safety"),
        },
    )
    .with_children(vec![
        ExternalNode::new("u", NodeKind::Unsupported),
        ExternalNode::new("p", NodeKind::Paragraph { rich_text: text("Goggles on") }),
    ]);

    let block = classify(&node).unwrap();
    let BlockContent::BulletedList { text, children } = block.content else {
        panic!("expected bulleted list");
    };
    assert_eq!(text, "Safety");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, "p");
    assert_eq!(children[0].sort_order, 0);
}

#[test]
fn test_media_and_code_capture_metadata() {
    let image = ExternalNode::new(
        "img",
        NodeKind::Image {
            url: "https://cdn.example.com/joint.png".to_string(),
            caption: text("Dovetail joint"),
        },
    );
    let code = ExternalNode::new(
        "code",
        NodeKind::Code {
            rich_text: text("cut(45)"),
            language: Some("python".to_string()),
        },
    );

    assert_eq!(
        classify(&image).unwrap().content,
        BlockContent::Image {
            url: "https://cdn.example.com/joint.png".to_string(),
            caption: "Dovetail joint".to_string(),
        }
    );
    assert_eq!(
        classify(&code).unwrap().content,
        BlockContent::Code {
            text: "cut(45)".to_string(),
            language: Some("python".to_string()),
        }
    );
}
