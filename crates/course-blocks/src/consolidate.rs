//! Consolidation of adjacent checklist fragments

use crate::block::DomainBlock;

/// Merge runs of adjacent checklist blocks and renumber `sort_order`.
///
/// Each run of checklist fragments becomes one checklist carrying the id of the
/// first fragment and every item in order. Any other block ends the run.
/// Children of list items and toggles are consolidated the same way.
pub fn consolidate(blocks: Vec<DomainBlock>) -> Vec<DomainBlock> {
    let mut merged: Vec<DomainBlock> = Vec::with_capacity(blocks.len());
    let mut pending: Option<DomainBlock> = None;

    for mut block in blocks {
        if block.is_checklist() {
            match pending.as_mut() {
                Some(aggregate) => aggregate.absorb_checklist(block),
                None => pending = Some(block),
            }
            continue;
        }

        if let Some(aggregate) = pending.take() {
            merged.push(aggregate);
        }
        if let Some(children) = block.content.children_mut() {
            *children = consolidate(std::mem::take(children));
        }
        merged.push(block);
    }

    if let Some(aggregate) = pending {
        merged.push(aggregate);
    }

    for (index, block) in merged.iter_mut().enumerate() {
        block.sort_order = index;
    }
    merged
}
