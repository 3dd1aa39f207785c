//! Lesson-level aggregates derived from a finished block sequence

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::block::{BlockContent, DomainBlock};

/// Sum of declared `duration_mins`; blocks without one contribute 0.
pub fn total_duration(blocks: &[DomainBlock]) -> u32 {
    blocks
        .iter()
        .filter_map(|block| block.duration_mins)
        .fold(0u32, u32::saturating_add)
}

/// Deduplicated criteria codes of every assessment grid, first-seen order.
pub fn extract_criteria(blocks: &[DomainBlock]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut codes = Vec::new();

    for block in blocks {
        if let BlockContent::AssessmentGrid { criteria } = &block.content {
            for code in criteria.iter().flat_map(|criterion| criterion.codes.iter()) {
                if seen.insert(code.as_str()) {
                    codes.push(code.clone());
                }
            }
        }
    }

    codes
}

/// Derived fields persisted on a lesson
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAggregates {
    pub duration_mins: u32,
    pub criteria: Vec<String>,
}

impl LessonAggregates {
    pub fn compute(blocks: &[DomainBlock]) -> Self {
        Self {
            duration_mins: total_duration(blocks),
            criteria: extract_criteria(blocks),
        }
    }
}
