//! Typed domain blocks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Closed set of block types persisted for a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    #[serde(rename = "heading-1")]
    Heading1,
    #[serde(rename = "heading-2")]
    Heading2,
    #[serde(rename = "heading-3")]
    Heading3,
    Paragraph,
    BulletedList,
    NumberedList,
    Toggle,
    Quote,
    Code,
    Image,
    Video,
    Divider,
    Callout,
    Checklist,
    SectionTimer,
    KeyPoint,
    Activity,
    DiscussionPrompt,
    MaterialsTable,
    AssessmentGrid,
    Table,
}

impl BlockType {
    /// Every block type, in declaration order
    pub const ALL: [BlockType; 21] = [
        Self::Heading1,
        Self::Heading2,
        Self::Heading3,
        Self::Paragraph,
        Self::BulletedList,
        Self::NumberedList,
        Self::Toggle,
        Self::Quote,
        Self::Code,
        Self::Image,
        Self::Video,
        Self::Divider,
        Self::Callout,
        Self::Checklist,
        Self::SectionTimer,
        Self::KeyPoint,
        Self::Activity,
        Self::DiscussionPrompt,
        Self::MaterialsTable,
        Self::AssessmentGrid,
        Self::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading1 => "heading-1",
            Self::Heading2 => "heading-2",
            Self::Heading3 => "heading-3",
            Self::Paragraph => "paragraph",
            Self::BulletedList => "bulleted-list",
            Self::NumberedList => "numbered-list",
            Self::Toggle => "toggle",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Image => "image",
            Self::Video => "video",
            Self::Divider => "divider",
            Self::Callout => "callout",
            Self::Checklist => "checklist",
            Self::SectionTimer => "section-timer",
            Self::KeyPoint => "key-point",
            Self::Activity => "activity",
            Self::DiscussionPrompt => "discussion-prompt",
            Self::MaterialsTable => "materials-table",
            Self::AssessmentGrid => "assessment-grid",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::invalid_shape(format!("unknown block type: {s}")))
    }
}

/// One item of a checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

/// One row of a materials table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One row of an assessment grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criteria codes referenced by this row (e.g. "1.1")
    pub codes: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Type-specific structured content of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockContent {
    #[serde(rename = "heading-1")]
    Heading1 { text: String },
    #[serde(rename = "heading-2")]
    Heading2 { text: String },
    #[serde(rename = "heading-3")]
    Heading3 { text: String },
    Paragraph { text: String },
    BulletedList {
        text: String,
        #[serde(default)]
        children: Vec<DomainBlock>,
    },
    NumberedList {
        text: String,
        #[serde(default)]
        children: Vec<DomainBlock>,
    },
    Toggle {
        text: String,
        #[serde(default)]
        children: Vec<DomainBlock>,
    },
    Quote { text: String },
    Code {
        text: String,
        #[serde(default)]
        language: Option<String>,
    },
    Image { url: String, caption: String },
    Video { url: String, caption: String },
    Divider,
    Callout {
        text: String,
        #[serde(default)]
        icon: Option<String>,
    },
    Checklist { items: Vec<ChecklistItem> },
    SectionTimer { title: String },
    KeyPoint {
        text: String,
        #[serde(default)]
        icon: Option<String>,
    },
    Activity {
        text: String,
        #[serde(default)]
        icon: Option<String>,
    },
    DiscussionPrompt { text: String },
    MaterialsTable { items: Vec<MaterialItem> },
    AssessmentGrid { criteria: Vec<Criterion> },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl BlockContent {
    /// The block type this content belongs to
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Heading1 { .. } => BlockType::Heading1,
            Self::Heading2 { .. } => BlockType::Heading2,
            Self::Heading3 { .. } => BlockType::Heading3,
            Self::Paragraph { .. } => BlockType::Paragraph,
            Self::BulletedList { .. } => BlockType::BulletedList,
            Self::NumberedList { .. } => BlockType::NumberedList,
            Self::Toggle { .. } => BlockType::Toggle,
            Self::Quote { .. } => BlockType::Quote,
            Self::Code { .. } => BlockType::Code,
            Self::Image { .. } => BlockType::Image,
            Self::Video { .. } => BlockType::Video,
            Self::Divider => BlockType::Divider,
            Self::Callout { .. } => BlockType::Callout,
            Self::Checklist { .. } => BlockType::Checklist,
            Self::SectionTimer { .. } => BlockType::SectionTimer,
            Self::KeyPoint { .. } => BlockType::KeyPoint,
            Self::Activity { .. } => BlockType::Activity,
            Self::DiscussionPrompt { .. } => BlockType::DiscussionPrompt,
            Self::MaterialsTable { .. } => BlockType::MaterialsTable,
            Self::AssessmentGrid { .. } => BlockType::AssessmentGrid,
            Self::Table { .. } => BlockType::Table,
        }
    }

    /// Nested blocks of list items and toggles
    pub fn children_mut(&mut self) -> Option<&mut Vec<DomainBlock>> {
        match self {
            Self::BulletedList { children, .. }
            | Self::NumberedList { children, .. }
            | Self::Toggle { children, .. } => Some(children),
            _ => None,
        }
    }
}

/// A classified, typed block.
///
/// `id` is the external id of the node it was classified from; a consolidated
/// checklist keeps the id of its first fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainBlock {
    pub id: String,
    pub content: BlockContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_mins: Option<u32>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub sort_order: usize,
}

impl DomainBlock {
    pub fn new(id: impl Into<String>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            content,
            duration_mins: None,
            is_required: false,
            sort_order: 0,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_mins = Some(minutes);
        self
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    pub fn is_checklist(&self) -> bool {
        matches!(self.content, BlockContent::Checklist { .. })
    }

    /// Append the items of another checklist to this one.
    ///
    /// No-op unless both blocks are checklists.
    pub(crate) fn absorb_checklist(&mut self, other: DomainBlock) {
        if let (BlockContent::Checklist { items }, BlockContent::Checklist { items: more }) =
            (&mut self.content, other.content)
        {
            items.extend(more);
        }
    }
}
