//! Parsing for course-sync.toml files
//!
//! A [`SyncConfig`] is the parsed content of a single config file. The
//! resolver merges a local overlay over the base file before validation.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 3;
pub const DEFAULT_PAGE_SIZE: usize = 100;

fn default_max_block_depth() -> usize {
    DEFAULT_MAX_BLOCK_DEPTH
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_enabled() -> bool {
    true
}

/// The `[sync]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Maximum depth of the block tree walked per lesson (top level is 1)
    #[serde(default = "default_max_block_depth")]
    pub max_block_depth: usize,

    /// Number of children served per page by paged sources
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Scope used when a run names no course: "all" or a course slug
    #[serde(default)]
    pub default_scope: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
            page_size: DEFAULT_PAGE_SIZE,
            default_scope: None,
        }
    }
}

/// One `[[courses]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    pub slug: String,

    /// Identifier of the course root page in the content source
    pub page_id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Identifier of the structure listing modules and lessons, when it is
    /// not the course page itself
    #[serde(default)]
    pub structure_id: Option<String>,
}

impl CourseConfig {
    pub fn new(slug: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            page_id: page_id.into(),
            title: None,
            enabled: true,
            structure_id: None,
        }
    }

    pub fn structure_key(&self) -> &str {
        self.structure_id.as_deref().unwrap_or(&self.page_id)
    }

    /// Whether `key` names this course by slug or by page id.
    pub fn matches(&self, key: &str) -> bool {
        self.slug == key || self.page_id == key
    }
}

/// Parsed course-sync.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub sync: Option<SyncSettings>,

    #[serde(default)]
    pub courses: Vec<CourseConfig>,
}

impl SyncConfig {
    /// Parse a config from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use course_core::config::SyncConfig;
    ///
    /// let config = SyncConfig::parse(r#"
    /// [sync]
    /// max_block_depth = 2
    ///
    /// [[courses]]
    /// slug = "joinery"
    /// page_id = "page-1"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.settings().max_block_depth, 2);
    /// assert_eq!(config.courses[0].slug, "joinery");
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Effective `[sync]` settings, defaults when the section is absent.
    pub fn settings(&self) -> SyncSettings {
        self.sync.clone().unwrap_or_default()
    }

    /// Merge another config over this one
    ///
    /// - A `[sync]` section in `other` replaces this one wholesale
    /// - Courses are matched by slug: matches are replaced in place, new
    ///   slugs are appended
    pub fn merge(&mut self, other: &SyncConfig) {
        if let Some(sync) = &other.sync {
            self.sync = Some(sync.clone());
        }

        for course in &other.courses {
            match self.courses.iter_mut().find(|c| c.slug == course.slug) {
                Some(existing) => *existing = course.clone(),
                None => self.courses.push(course.clone()),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let settings = self.settings();
        if settings.max_block_depth == 0 {
            return Err(Error::invalid_config("sync.max_block_depth must be at least 1"));
        }
        if settings.page_size == 0 {
            return Err(Error::invalid_config("sync.page_size must be at least 1"));
        }

        let mut slugs = HashSet::new();
        for course in &self.courses {
            if course.slug.trim().is_empty() {
                return Err(Error::invalid_config("course slug must not be empty"));
            }
            if course.page_id.trim().is_empty() {
                return Err(Error::invalid_config(format!(
                    "course '{}' has an empty page_id",
                    course.slug
                )));
            }
            if !slugs.insert(course.slug.as_str()) {
                return Err(Error::invalid_config(format!(
                    "duplicate course slug '{}'",
                    course.slug
                )));
            }
        }

        if let Some(scope) = &settings.default_scope
            && scope != "all"
            && self.find_course(scope).is_none()
        {
            return Err(Error::invalid_config(format!(
                "default_scope '{}' does not name a configured course",
                scope
            )));
        }

        Ok(())
    }

    /// Enabled courses in configured order
    pub fn enabled_courses(&self) -> impl Iterator<Item = &CourseConfig> {
        self.courses.iter().filter(|c| c.enabled)
    }

    /// Find a course by slug or page id
    pub fn find_course(&self, key: &str) -> Option<&CourseConfig> {
        self.courses.iter().find(|c| c.matches(key))
    }
}
