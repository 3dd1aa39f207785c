//! Classification of raw nodes into domain blocks.
//!
//! Precedence is fixed per source kind:
//!
//! - callout: section timer > key point > activity > discussion prompt > callout
//! - table: materials table > assessment grid > table
//! - to-do: checklist fragment (merged later by [`crate::consolidate`])
//! - paragraph: dropped when blank
//!
//! Kinds without a rule classify to `None` and are left out of the lesson.

use regex::Regex;
use std::sync::LazyLock;

use crate::block::{BlockContent, ChecklistItem, Criterion, DomainBlock, MaterialItem};
use crate::node::{ExternalNode, NodeKind, RichText, plain_text};

/// Minutes assumed for a timer callout that names no duration
pub const DEFAULT_TIMER_MINUTES: u32 = 5;

/// An integer followed by a minute unit, e.g. "10 minutes", "5min"
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:minutes|minute|mins|min)\b").expect("Invalid duration regex")
});

/// Dotted criteria codes, e.g. "1.1", "2.3.1"
static CRITERIA_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)+\b").expect("Invalid criteria code regex"));

const MATERIALS_KEYWORDS: &[&str] = &[
    "material",
    "quantity",
    "notes",
    "item",
    "resource",
    "equipment",
    "tool",
];

const ASSESSMENT_KEYWORDS: &[&str] = &[
    "criterion",
    "criteria",
    "evidence",
    "assessment",
    "learning outcome",
    "ocn",
];

/// Separators left behind when a duration is cut out of a title
const TITLE_SEPARATORS: &[char] = &['-', '–', '—', ':', '|', ',', '(', ')'];

/// Emoji sets that steer callout classification.
///
/// Icons are compared with variation selectors removed, so "⏱️" and "⏱" match
/// the same entry.
#[derive(Debug, Clone)]
pub struct IconSets {
    pub timer: Vec<String>,
    pub key_point: Vec<String>,
    pub activity: Vec<String>,
    pub discussion: Vec<String>,
    pub warning: Vec<String>,
}

impl Default for IconSets {
    fn default() -> Self {
        fn set(icons: &[&str]) -> Vec<String> {
            icons.iter().map(|icon| normalize_icon(icon)).collect()
        }

        Self {
            timer: set(&["⏱", "⏰", "⏲", "🕐", "🕑", "🕒", "⌛", "⏳"]),
            key_point: set(&["🔑", "💡", "⭐", "📌", "🗝"]),
            activity: set(&["🎯", "🏃", "✋", "🛠", "✏", "🧩", "🎨"]),
            discussion: set(&["💬", "🗣", "❓", "🤔", "💭"]),
            warning: set(&["⚠", "🚨", "❗", "🛑", "⛔"]),
        }
    }
}

fn normalize_icon(icon: &str) -> String {
    icon.trim().chars().filter(|c| *c != '\u{FE0F}').collect()
}

fn contains_icon(set: &[String], icon: Option<&str>) -> bool {
    match icon {
        Some(icon) => {
            let icon = normalize_icon(icon);
            set.iter().any(|candidate| *candidate == icon)
        }
        None => false,
    }
}

/// Maps raw nodes to typed domain blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockClassifier {
    icons: IconSets,
}

impl BlockClassifier {
    pub fn new(icons: IconSets) -> Self {
        Self { icons }
    }

    /// Classify a sibling sequence, dropping unclassified nodes.
    ///
    /// `sort_order` of the result is its index in the returned sequence.
    pub fn classify_all(&self, nodes: &[ExternalNode]) -> Vec<DomainBlock> {
        let mut blocks: Vec<DomainBlock> = nodes.iter().filter_map(|node| self.classify(node)).collect();
        for (index, block) in blocks.iter_mut().enumerate() {
            block.sort_order = index;
        }
        blocks
    }

    /// Classify one node (and, for list items and toggles, its children).
    pub fn classify(&self, node: &ExternalNode) -> Option<DomainBlock> {
        let id = node.id.as_str();
        let block = match &node.kind {
            NodeKind::Paragraph { rich_text } => {
                let text = plain_text(rich_text);
                if text.trim().is_empty() {
                    tracing::trace!(node_id = id, "Dropping blank paragraph");
                    return None;
                }
                DomainBlock::new(id, BlockContent::Paragraph { text })
            }
            NodeKind::Heading1 { rich_text } => DomainBlock::new(
                id,
                BlockContent::Heading1 {
                    text: plain_text(rich_text),
                },
            ),
            NodeKind::Heading2 { rich_text } => DomainBlock::new(
                id,
                BlockContent::Heading2 {
                    text: plain_text(rich_text),
                },
            ),
            NodeKind::Heading3 { rich_text } => DomainBlock::new(
                id,
                BlockContent::Heading3 {
                    text: plain_text(rich_text),
                },
            ),
            NodeKind::BulletedListItem { rich_text } => DomainBlock::new(
                id,
                BlockContent::BulletedList {
                    text: plain_text(rich_text),
                    children: self.classify_all(&node.children),
                },
            ),
            NodeKind::NumberedListItem { rich_text } => DomainBlock::new(
                id,
                BlockContent::NumberedList {
                    text: plain_text(rich_text),
                    children: self.classify_all(&node.children),
                },
            ),
            NodeKind::Toggle { rich_text } => DomainBlock::new(
                id,
                BlockContent::Toggle {
                    text: plain_text(rich_text),
                    children: self.classify_all(&node.children),
                },
            ),
            NodeKind::Quote { rich_text } => DomainBlock::new(
                id,
                BlockContent::Quote {
                    text: plain_text(rich_text),
                },
            ),
            NodeKind::Code {
                rich_text,
                language,
            } => DomainBlock::new(
                id,
                BlockContent::Code {
                    text: plain_text(rich_text),
                    language: language.clone(),
                },
            ),
            NodeKind::Image { url, caption } => DomainBlock::new(
                id,
                BlockContent::Image {
                    url: url.clone(),
                    caption: plain_text(caption),
                },
            ),
            NodeKind::Video { url, caption } => DomainBlock::new(
                id,
                BlockContent::Video {
                    url: url.clone(),
                    caption: plain_text(caption),
                },
            ),
            NodeKind::Divider => DomainBlock::new(id, BlockContent::Divider),
            NodeKind::Callout { rich_text, icon } => {
                self.classify_callout(id, &plain_text(rich_text), icon.as_deref())
            }
            NodeKind::ToDo { rich_text, checked } => DomainBlock::new(
                id,
                BlockContent::Checklist {
                    items: vec![ChecklistItem {
                        text: plain_text(rich_text),
                        checked: *checked,
                    }],
                },
            ),
            NodeKind::Table { has_column_header } => {
                classify_table(id, *has_column_header, &node.children)
            }
            NodeKind::TableRow { .. } | NodeKind::Unsupported => {
                tracing::debug!(node_id = id, kind = node.kind.tag(), "No classification for node");
                return None;
            }
        };
        Some(block)
    }

    fn classify_callout(&self, id: &str, text: &str, icon: Option<&str>) -> DomainBlock {
        if let Some((minutes, title)) = parse_duration(text) {
            return DomainBlock::new(id, BlockContent::SectionTimer { title }).with_duration(minutes);
        }

        if contains_icon(&self.icons.timer, icon) && !text.chars().any(|c| c.is_ascii_digit()) {
            return DomainBlock::new(
                id,
                BlockContent::SectionTimer {
                    title: text.trim().to_string(),
                },
            )
            .with_duration(DEFAULT_TIMER_MINUTES);
        }

        let icon_owned = icon.map(str::to_string);
        if contains_icon(&self.icons.key_point, icon) {
            DomainBlock::new(
                id,
                BlockContent::KeyPoint {
                    text: text.to_string(),
                    icon: icon_owned,
                },
            )
        } else if contains_icon(&self.icons.activity, icon) {
            DomainBlock::new(
                id,
                BlockContent::Activity {
                    text: text.to_string(),
                    icon: icon_owned,
                },
            )
        } else if contains_icon(&self.icons.discussion, icon) {
            DomainBlock::new(
                id,
                BlockContent::DiscussionPrompt {
                    text: text.to_string(),
                },
            )
        } else {
            let is_required = contains_icon(&self.icons.warning, icon);
            DomainBlock::new(
                id,
                BlockContent::Callout {
                    text: text.to_string(),
                    icon: icon_owned,
                },
            )
            .required(is_required)
        }
    }
}

/// Extract the first "N minutes" duration and the text with it cut out.
fn parse_duration(text: &str) -> Option<(u32, String)> {
    let captures = DURATION_REGEX.captures(text)?;
    let minutes = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let matched = captures.get(0)?;

    let mut title = String::with_capacity(text.len());
    title.push_str(&text[..matched.start()]);
    title.push_str(&text[matched.end()..]);
    let title = title
        .trim_matches(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c))
        .to_string();

    Some((minutes, title))
}

fn cells_text(cells: &[Vec<RichText>]) -> Vec<String> {
    cells.iter().map(|cell| plain_text(cell).trim().to_string()).collect()
}

fn classify_table(id: &str, has_column_header: bool, children: &[ExternalNode]) -> DomainBlock {
    let rows: Vec<Vec<String>> = children
        .iter()
        .filter_map(|child| match &child.kind {
            NodeKind::TableRow { cells } => Some(cells_text(cells)),
            _ => None,
        })
        .collect();

    let headers: Vec<String> = rows
        .first()
        .map(|row| row.iter().map(|h| h.to_lowercase()).collect())
        .unwrap_or_default();
    let body = rows.get(1..).unwrap_or_default();

    if header_matches(&headers, MATERIALS_KEYWORDS) {
        return DomainBlock::new(
            id,
            BlockContent::MaterialsTable {
                items: materials_items(&headers, body),
            },
        );
    }

    if header_matches(&headers, ASSESSMENT_KEYWORDS) {
        return DomainBlock::new(
            id,
            BlockContent::AssessmentGrid {
                criteria: assessment_criteria(&headers, body),
            },
        );
    }

    let (headers, rows) = if has_column_header {
        let mut rows = rows;
        let headers = if rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
        };
        (headers, rows)
    } else {
        (Vec::new(), rows)
    };
    DomainBlock::new(id, BlockContent::Table { headers, rows })
}

fn header_matches(headers: &[String], keywords: &[&str]) -> bool {
    headers
        .iter()
        .any(|header| keywords.iter().any(|keyword| header.contains(keyword)))
}

fn column_for(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| keywords.iter().any(|keyword| header.contains(keyword)))
}

fn non_empty_cell(row: &[String], column: Option<usize>) -> Option<String> {
    column
        .and_then(|c| row.get(c))
        .filter(|cell| !cell.is_empty())
        .cloned()
}

fn materials_items(headers: &[String], body: &[Vec<String>]) -> Vec<MaterialItem> {
    let name_col = column_for(headers, &["item", "material", "resource", "equipment", "tool"]).unwrap_or(0);
    let quantity_col = column_for(headers, &["quantity", "qty"]);
    let notes_col = column_for(headers, &["note"]);

    body.iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| MaterialItem {
            name: row.get(name_col).cloned().unwrap_or_default(),
            quantity: non_empty_cell(row, quantity_col),
            notes: non_empty_cell(row, notes_col),
        })
        .collect()
}

fn assessment_criteria(headers: &[String], body: &[Vec<String>]) -> Vec<Criterion> {
    let code_col = column_for(headers, &["criteri", "code", "ocn"]).unwrap_or(0);
    let evidence_col = column_for(headers, &["evidence"]);
    let description_col = column_for(headers, &["description", "outcome", "learning"])
        .filter(|c| *c != code_col)
        .or_else(|| (0..headers.len()).find(|c| *c != code_col && Some(*c) != evidence_col));

    body.iter()
        .filter_map(|row| {
            let code_cell = row.get(code_col).map(String::as_str).unwrap_or_default();
            let mut codes: Vec<String> = CRITERIA_CODE_REGEX
                .find_iter(code_cell)
                .map(|m| m.as_str().to_string())
                .collect();
            if codes.is_empty() && !code_cell.is_empty() && !code_cell.contains(char::is_whitespace) {
                codes.push(code_cell.to_string());
            }

            let description = non_empty_cell(row, description_col).unwrap_or_default();
            if codes.is_empty() && description.is_empty() {
                return None;
            }

            Some(Criterion {
                codes,
                description,
                evidence: non_empty_cell(row, evidence_col),
            })
        })
        .collect()
}
