//! Persisted record model
//!
//! Every level of the hierarchy is stored as a [`Record`] keyed by the
//! external identifier it was created from. The level-specific payload lives
//! in the record's `fields`, one [`EntityFields`] type per level.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use course_blocks::{BlockContent, BlockType, DomainBlock};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Parent key under which course records are stored.
pub const COURSE_ROOT: &str = "__root__";

static WEEK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bweek\s*(\d+)\b").expect("Invalid week regex"));

/// Level of the course hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Course,
    Module,
    Lesson,
    Block,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Module => "module",
            Self::Lesson => "lesson",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level-specific payload of a persisted record.
pub trait EntityFields:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const LEVEL: Level;

    /// Position among siblings, used to order `find_children` results.
    fn sort_order(&self) -> usize {
        0
    }
}

/// A persisted entity at any level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<F> {
    pub external_id: String,
    pub parent_id: String,
    pub fields: F,
    pub created_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFields {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl EntityFields for CourseFields {
    const LEVEL: Level = Level::Course;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFields {
    pub title: String,
    pub sort_order: usize,
    pub week_number: u32,
}

impl ModuleFields {
    pub fn new(title: impl Into<String>, sort_order: usize) -> Self {
        let title = title.into();
        let week_number = derive_week_number(&title, sort_order);
        Self {
            title,
            sort_order,
            week_number,
        }
    }
}

impl EntityFields for ModuleFields {
    const LEVEL: Level = Level::Module;

    fn sort_order(&self) -> usize {
        self.sort_order
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFields {
    pub title: String,
    pub sort_order: usize,
    pub duration_mins: u32,
    pub criteria: Vec<String>,
    /// Last-edited stamp reported by the source when this lesson's blocks
    /// were last reconciled.
    #[serde(default)]
    pub source_edited_at: Option<DateTime<Utc>>,
}

impl EntityFields for LessonFields {
    const LEVEL: Level = Level::Lesson;

    fn sort_order(&self) -> usize {
        self.sort_order
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFields {
    pub block_type: BlockType,
    pub content: BlockContent,
    pub duration_mins: Option<u32>,
    pub is_required: bool,
    pub sort_order: usize,
}

impl From<&DomainBlock> for BlockFields {
    fn from(block: &DomainBlock) -> Self {
        Self {
            block_type: block.block_type(),
            content: block.content.clone(),
            duration_mins: block.duration_mins,
            is_required: block.is_required,
            sort_order: block.sort_order,
        }
    }
}

impl EntityFields for BlockFields {
    const LEVEL: Level = Level::Block;

    fn sort_order(&self) -> usize {
        self.sort_order
    }
}

/// Week number for a module: taken from a "Week N" title when present,
/// otherwise the 1-based position.
pub fn derive_week_number(title: &str, sort_order: usize) -> u32 {
    WEEK_REGEX
        .captures(title)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or_else(|| u32::try_from(sort_order).unwrap_or(u32::MAX).saturating_add(1))
}
