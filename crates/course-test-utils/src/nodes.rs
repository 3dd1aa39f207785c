//! Builders for raw source nodes and course outlines.

use chrono::{DateTime, TimeZone, Utc};
use course_blocks::{ExternalNode, NodeKind, RichText};
use course_core::{CourseConfig, CourseStructure, LessonOutline, ModuleOutline, SyncConfig};

pub fn text(value: &str) -> Vec<RichText> {
    vec![RichText::plain(value)]
}

pub fn paragraph(id: &str, value: &str) -> ExternalNode {
    ExternalNode::new(id, NodeKind::Paragraph { rich_text: text(value) })
}

pub fn heading(id: &str, value: &str) -> ExternalNode {
    ExternalNode::new(id, NodeKind::Heading2 { rich_text: text(value) })
}

pub fn todo(id: &str, value: &str, checked: bool) -> ExternalNode {
    ExternalNode::new(
        id,
        NodeKind::ToDo {
            rich_text: text(value),
            checked,
        },
    )
}

pub fn callout(id: &str, value: &str, icon: Option<&str>) -> ExternalNode {
    ExternalNode::new(
        id,
        NodeKind::Callout {
            rich_text: text(value),
            icon: icon.map(str::to_string),
        },
    )
}

pub fn divider(id: &str) -> ExternalNode {
    ExternalNode::new(id, NodeKind::Divider)
}

pub fn toggle(id: &str, value: &str, children: Vec<ExternalNode>) -> ExternalNode {
    ExternalNode::new(id, NodeKind::Toggle { rich_text: text(value) }).with_children(children)
}

/// Table node whose first row is the header.
pub fn table(id: &str, rows: &[&[&str]]) -> ExternalNode {
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            ExternalNode::new(
                format!("{id}-row-{i}"),
                NodeKind::TableRow {
                    cells: cells.iter().map(|c| text(c)).collect(),
                },
            )
        })
        .collect();
    ExternalNode::new(
        id,
        NodeKind::Table {
            has_column_header: true,
        },
    )
    .with_children(rows)
}

pub fn lesson(id: &str, title: &str) -> LessonOutline {
    LessonOutline {
        id: id.to_string(),
        title: title.to_string(),
        edited_at: None,
    }
}

pub fn lesson_edited(id: &str, title: &str, edited_at: DateTime<Utc>) -> LessonOutline {
    LessonOutline {
        edited_at: Some(edited_at),
        ..lesson(id, title)
    }
}

pub fn module(id: &str, title: &str, lessons: Vec<LessonOutline>) -> ModuleOutline {
    ModuleOutline {
        id: id.to_string(),
        title: title.to_string(),
        lessons,
    }
}

pub fn structure(modules: Vec<ModuleOutline>) -> CourseStructure {
    CourseStructure { modules }
}

/// Fixed timestamp on 2026-01-01, `minute` minutes past nine.
pub fn stamp(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 9, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("stamp: invalid minute {minute}"))
}

/// Config with one enabled course per `(slug, page_id)` pair.
pub fn config(courses: &[(&str, &str)]) -> SyncConfig {
    SyncConfig {
        sync: None,
        courses: courses
            .iter()
            .map(|(slug, page_id)| CourseConfig::new(*slug, *page_id))
            .collect(),
    }
}
