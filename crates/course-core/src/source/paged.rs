//! Depth-bounded walk over paginated child listings

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use course_blocks::ExternalNode;

use super::{SourceError, SourceResult};

/// One page of direct children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPage {
    pub nodes: Vec<ExternalNode>,
    pub next_cursor: Option<String>,
}

/// Lists the direct children of a block one page at a time.
#[async_trait]
pub trait BlockPager: Send + Sync {
    async fn fetch_children_page(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> SourceResult<BlockPage>;
}

/// All direct children of `block_id`, draining every page.
pub async fn drain_children<P>(pager: &P, block_id: &str) -> SourceResult<Vec<ExternalNode>>
where
    P: BlockPager + ?Sized,
{
    let mut nodes = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen_cursors = HashSet::new();

    loop {
        let page = pager
            .fetch_children_page(block_id, cursor.as_deref())
            .await?;
        nodes.extend(page.nodes);

        match page.next_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(SourceError::fetch(
                        block_id,
                        format!("pagination cursor '{}' repeated", next),
                    ));
                }
                cursor = Some(next);
            }
            None => return Ok(nodes),
        }
    }
}

struct Slot {
    node: ExternalNode,
    children: Vec<usize>,
}

/// Fetch the block tree under `root_id`, at most `max_depth` levels deep.
///
/// Nodes are collected breadth-first into an arena and assembled into trees
/// once the walk is done. A node at the depth limit keeps its `has_children`
/// flag but gets no children. Children a pager returns inline are walked like
/// fetched ones: trimmed at the depth limit, and their own `has_children`
/// descendants fetched.
pub async fn drain_block_tree<P>(
    pager: &P,
    root_id: &str,
    max_depth: usize,
) -> SourceResult<Vec<ExternalNode>>
where
    P: BlockPager + ?Sized,
{
    let mut arena: Vec<Slot> = Vec::new();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    let top_level = drain_children(pager, root_id).await?;
    let roots: Vec<usize> = top_level
        .into_iter()
        .map(|node| {
            let index = arena.len();
            arena.push(Slot {
                node,
                children: Vec::new(),
            });
            queue.push_back((index, 1));
            index
        })
        .collect();

    while let Some((index, depth)) = queue.pop_front() {
        let inline = std::mem::take(&mut arena[index].node.children);
        let node = &arena[index].node;
        if depth >= max_depth {
            if node.has_children || !inline.is_empty() {
                tracing::trace!(id = %node.id, depth, "Depth limit reached, children dropped");
            }
            continue;
        }

        let children = if !inline.is_empty() {
            inline
        } else if node.has_children {
            let parent_id = node.id.clone();
            drain_children(pager, &parent_id).await?
        } else {
            continue;
        };
        for child in children {
            let child_index = arena.len();
            arena.push(Slot {
                node: child,
                children: Vec::new(),
            });
            arena[index].children.push(child_index);
            queue.push_back((child_index, depth + 1));
        }
    }

    // Children always sit at higher indices than their parent, so assembling
    // from the back finishes every subtree before its parent needs it.
    let mut built: Vec<Option<ExternalNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);
    while let Some(Slot { mut node, children }) = arena.pop() {
        let index = arena.len();
        node.children
            .extend(children.iter().filter_map(|&child| built[child].take()));
        built[index] = Some(node);
    }

    Ok(roots
        .into_iter()
        .filter_map(|index| built[index].take())
        .collect())
}
