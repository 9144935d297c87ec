//! Block extraction: find the atomic, non-splittable regions of a laid-out
//! fragment and the forced page breaks between them.
//!
//! Elements carrying [`BLOCK_MARKER`] are blocks. When a fragment has no
//! markers at all, each visible direct child of the root is a block instead.
//! Markers nested inside another marked element are part of that outer block.

use crate::rendering::layout::{Fragment, NodeId, BLOCK_MARKER, BREAK_MARKER};
use crate::{Error, Result};

/// An atomic layout region, in CSS px from the fragment top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub vertical_start: f32,
    pub vertical_end: f32,
    pub force_break_before: bool,
    pub node: NodeId,
}

impl Block {
    pub fn height(&self) -> f32 {
        self.vertical_end - self.vertical_start
    }
}

/// Extract blocks ordered by top offset (ties keep document order).
///
/// Fails with [`Error::NoContent`] when nothing renderable is found.
pub fn extract_blocks(fragment: &Fragment) -> Result<Vec<Block>> {
    let mut candidates = marked_blocks(fragment);
    if candidates.is_empty() {
        log::debug!("no {} markers; using direct children of the root", BLOCK_MARKER);
        candidates = fragment
            .node(Fragment::ROOT)
            .children
            .iter()
            .copied()
            .filter(|&id| {
                let node = fragment.node(id);
                node.tag().is_some() && !node.is_hidden()
            })
            .collect();
    }

    let mut blocks: Vec<Block> = Vec::with_capacity(candidates.len());
    let mut consumed_breaks: Vec<NodeId> = Vec::new();
    // Set by a skipped zero-height candidate; lands on the next block kept.
    let mut carried_break = false;
    for id in candidates {
        let rect = fragment.node(id).rect;
        let force = has_break(fragment, id) || inherited_break(fragment, id, &mut consumed_breaks);
        if rect.height <= 0.0 {
            carried_break |= force;
            continue;
        }
        let force = force || std::mem::take(&mut carried_break);
        blocks.push(Block {
            vertical_start: rect.y,
            vertical_end: rect.bottom(),
            force_break_before: force,
            node: id,
        });
    }

    if blocks.is_empty() {
        return Err(Error::NoContent);
    }
    // Stable: equal tops stay in document order.
    blocks.sort_by(|a, b| a.vertical_start.total_cmp(&b.vertical_start));
    log::debug!(
        "extracted {} blocks ({} forced breaks)",
        blocks.len(),
        blocks.iter().filter(|b| b.force_break_before).count()
    );
    Ok(blocks)
}

/// Outermost visible marked elements in document order.
fn marked_blocks(fragment: &Fragment) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![Fragment::ROOT];
    while let Some(id) = stack.pop() {
        let node = fragment.node(id);
        if node.is_hidden() {
            continue;
        }
        if id != Fragment::ROOT && node.has_attr(BLOCK_MARKER) {
            out.push(id);
            continue;
        }
        stack.extend(node.children.iter().rev().copied());
    }
    out
}

fn has_break(fragment: &Fragment, id: NodeId) -> bool {
    let node = fragment.node(id);
    node.has_attr(BREAK_MARKER) || node.style.break_before
}

/// A break marker on an unmarked ancestor applies to the first block inside it.
fn inherited_break(fragment: &Fragment, id: NodeId, consumed: &mut Vec<NodeId>) -> bool {
    let ancestor = fragment
        .ancestors(id)
        .take_while(|&a| a != Fragment::ROOT)
        .find(|&a| has_break(fragment, a));
    match ancestor {
        Some(a) if !consumed.contains(&a) => {
            consumed.push(a);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::font::FontSet;

    fn blocks_of(html: &str) -> Result<Vec<Block>> {
        let mut f = Fragment::parse(html);
        f.layout(500.0, &FontSet::empty());
        extract_blocks(&f)
    }

    #[test]
    fn markers_take_priority_over_children() {
        let blocks = blocks_of(
            r#"<div style="height: 30px"></div>
               <div data-pdf-block style="height: 40px"></div>
               <section><div data-pdf-block style="height: 50px"></div></section>"#,
        )
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[0].vertical_start, blocks[0].vertical_end), (30.0, 70.0));
        assert_eq!((blocks[1].vertical_start, blocks[1].vertical_end), (70.0, 120.0));
    }

    #[test]
    fn falls_back_to_root_children() {
        let blocks = blocks_of(
            r#"<div style="height: 10px"></div><div style="display:none; height: 10px"></div><div style="height: 20px"></div>"#,
        )
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].height(), 20.0);
    }

    #[test]
    fn nested_markers_collapse_into_outer_block() {
        let blocks = blocks_of(
            r#"<div data-pdf-block><div data-pdf-block style="height: 10px"></div><div style="height: 5px"></div></div>"#,
        )
        .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].height(), 15.0);
    }

    #[test]
    fn break_markers_and_styles_force_breaks() {
        let blocks = blocks_of(
            r#"<div data-pdf-block style="height: 10px"></div>
               <div data-pdf-block data-pdf-break-before style="height: 10px"></div>
               <div data-pdf-block style="height: 10px; page-break-before: always"></div>
               <div data-pdf-block style="height: 10px"></div>"#,
        )
        .unwrap();
        let forced: Vec<bool> = blocks.iter().map(|b| b.force_break_before).collect();
        assert_eq!(forced, vec![false, true, true, false]);
    }

    #[test]
    fn ancestor_break_applies_to_first_block_only() {
        let blocks = blocks_of(
            r#"<div data-pdf-block style="height: 10px"></div>
               <section data-pdf-break-before>
                 <div data-pdf-block style="height: 10px"></div>
                 <div data-pdf-block style="height: 10px"></div>
               </section>"#,
        )
        .unwrap();
        let forced: Vec<bool> = blocks.iter().map(|b| b.force_break_before).collect();
        assert_eq!(forced, vec![false, true, false]);
    }

    #[test]
    fn empty_break_spacer_moves_break_to_next_block() {
        let blocks = blocks_of(
            r#"<div data-pdf-block style="height: 10px"></div>
               <div data-pdf-block data-pdf-break-before></div>
               <div data-pdf-block style="height: 10px"></div>
               <div data-pdf-block style="height: 10px"></div>"#,
        )
        .unwrap();
        let forced: Vec<bool> = blocks.iter().map(|b| b.force_break_before).collect();
        assert_eq!(forced, vec![false, true, false]);
    }

    #[test]
    fn empty_fragment_has_no_content() {
        assert!(matches!(blocks_of(""), Err(Error::NoContent)));
        assert!(matches!(blocks_of("<div></div>"), Err(Error::NoContent)));
    }
}
