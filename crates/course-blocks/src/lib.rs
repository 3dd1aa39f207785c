//! Block transformation pipeline for Course Sync
//!
//! Turns the raw node tree fetched from the content source into the ordered,
//! typed block sequence persisted for one lesson:
//!
//! ```text
//! ExternalNode tree -> BlockClassifier -> consolidate -> LessonAggregates
//! ```
//!
//! - [`node`]: closed tagged union of source node kinds, validated at ingestion
//! - [`block`]: typed domain blocks
//! - [`classify`]: node -> block classification with fixed precedence rules
//! - [`consolidate`]: merges adjacent checklist fragments, renumbers order
//! - [`aggregate`]: lesson duration and assessment-criteria codes
//!
//! Everything in this crate is pure: no I/O, no async.

pub mod aggregate;
pub mod block;
pub mod classify;
pub mod consolidate;
pub mod error;
pub mod node;

pub use aggregate::{LessonAggregates, extract_criteria, total_duration};
pub use block::{BlockContent, BlockType, ChecklistItem, Criterion, DomainBlock, MaterialItem};
pub use classify::{BlockClassifier, IconSets};
pub use consolidate::consolidate;
pub use error::{Error, Result};
pub use node::{ExternalNode, NodeKind, RichText, parse_nodes};

/// Output of the full pipeline for one lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedLesson {
    /// Consolidated blocks with dense `sort_order`
    pub blocks: Vec<DomainBlock>,
    /// Derived aggregates over `blocks`
    pub aggregates: LessonAggregates,
}

/// Classify, consolidate and aggregate one lesson's node tree.
pub fn transform_lesson(classifier: &BlockClassifier, nodes: &[ExternalNode]) -> TransformedLesson {
    let blocks = consolidate(classifier.classify_all(nodes));
    let aggregates = LessonAggregates::compute(&blocks);
    TransformedLesson { blocks, aggregates }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Vec<RichText> {
        vec![RichText::plain(s)]
    }

    #[test]
    fn transform_lesson_runs_all_stages() {
        let nodes = vec![
            ExternalNode::new(
                "t1",
                NodeKind::Callout {
                    rich_text: text("Intro - 10 minutes"),
                    icon: None,
                },
            ),
            ExternalNode::new(
                "c1",
                NodeKind::ToDo {
                    rich_text: text("Bring pens"),
                    checked: false,
                },
            ),
            ExternalNode::new(
                "c2",
                NodeKind::ToDo {
                    rich_text: text("Bring paper"),
                    checked: true,
                },
            ),
            ExternalNode::new("p1", NodeKind::Paragraph { rich_text: text("  ") }),
        ];

        let lesson = transform_lesson(&BlockClassifier::default(), &nodes);

        assert_eq!(lesson.blocks.len(), 2);
        assert_eq!(lesson.blocks[0].block_type(), BlockType::SectionTimer);
        assert_eq!(lesson.blocks[1].block_type(), BlockType::Checklist);
        assert_eq!(lesson.blocks[1].sort_order, 1);
        assert_eq!(lesson.aggregates.duration_mins, 10);
        assert!(lesson.aggregates.criteria.is_empty());
    }
}
