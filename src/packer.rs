//! Page packing: assign blocks to pages without ever splitting one.
//!
//! Greedy first-fit in a single pass with no lookahead beyond the current
//! page. A block starts a new page when the current page already holds
//! something and either the block forces a break or adding it (plus the gap
//! that precedes every non-first block) would exceed the page content height.
//! A block taller than a page therefore always ends up alone on its own page,
//! overflowing it rather than being cut.

use crate::{Error, Result};

/// Page geometry in the same unit as the item heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackGeometry {
    pub page_content_height: f32,
    pub gap: f32,
}

impl PackGeometry {
    fn validate(&self) -> Result<()> {
        if !self.page_content_height.is_finite() || self.page_content_height <= 0.0 {
            return Err(Error::Config(format!("page content height must be positive, got {}", self.page_content_height)));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(Error::Config(format!("inter-block gap must be non-negative, got {}", self.gap)));
        }
        Ok(())
    }
}

/// What the packer needs to know about a block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackItem {
    pub height: f32,
    pub force_break_before: bool,
}

/// One block placed on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// Index into the packer's input
    pub block: usize,
    /// Height consumed on the page before this block, gaps included
    pub offset: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedPage {
    pub slices: Vec<PageSlice>,
    /// The page was opened by a forced break rather than by overflow
    pub forced: bool,
    pub consumed: f32,
}

impl PackedPage {
    pub fn blocks(&self) -> impl Iterator<Item = usize> + '_ {
        self.slices.iter().map(|s| s.block)
    }
}

/// Pack items onto pages in order.
pub fn pack(items: &[PackItem], geometry: PackGeometry) -> Result<Vec<PackedPage>> {
    geometry.validate()?;
    if items.is_empty() {
        return Err(Error::NoContent);
    }

    let mut pages = Vec::new();
    let mut page = PackedPage::default();
    for (index, item) in items.iter().enumerate() {
        if !item.height.is_finite() || item.height < 0.0 {
            return Err(Error::Config(format!("block {} has invalid height {}", index, item.height)));
        }
        let occupied = !page.slices.is_empty();
        let overflows = page.consumed + geometry.gap + item.height > geometry.page_content_height;
        if occupied && (item.force_break_before || overflows) {
            pages.push(std::mem::take(&mut page));
            page.forced = item.force_break_before;
        }

        let offset = if page.slices.is_empty() { 0.0 } else { page.consumed + geometry.gap };
        page.slices.push(PageSlice { block: index, offset, height: item.height });
        page.consumed = offset + item.height;

        if item.height > geometry.page_content_height {
            log::warn!(
                "block {} ({:.1}) is taller than a page ({:.1}); it will overflow",
                index,
                item.height,
                geometry.page_content_height
            );
        }
    }
    pages.push(page);
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(heights: &[f32]) -> Vec<PackItem> {
        heights.iter().map(|&height| PackItem { height, force_break_before: false }).collect()
    }

    fn layout(pages: &[PackedPage]) -> Vec<Vec<usize>> {
        pages.iter().map(|p| p.blocks().collect()).collect()
    }

    #[test]
    fn offsets_include_gaps() {
        let pages = pack(&items(&[100.0, 50.0, 25.0]), PackGeometry { page_content_height: 1000.0, gap: 10.0 }).unwrap();
        let offsets: Vec<f32> = pages[0].slices.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 110.0, 170.0]);
        assert_eq!(pages[0].consumed, 195.0);
    }

    #[test]
    fn exact_fit_stays_on_page() {
        let pages = pack(&items(&[120.0, 120.0]), PackGeometry { page_content_height: 250.0, gap: 10.0 }).unwrap();
        assert_eq!(layout(&pages), vec![vec![0, 1]]);
        assert_eq!(pages[0].consumed, 250.0);
    }

    #[test]
    fn oversized_block_after_content_moves_to_own_page() {
        let pages = pack(&items(&[100.0, 300.0, 50.0]), PackGeometry { page_content_height: 250.0, gap: 10.0 }).unwrap();
        assert_eq!(layout(&pages), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(pages[1].consumed, 300.0);
    }

    #[test]
    fn forced_pages_are_flagged() {
        let mut input = items(&[10.0, 10.0]);
        input[1].force_break_before = true;
        let pages = pack(&input, PackGeometry { page_content_height: 100.0, gap: 0.0 }).unwrap();
        assert!(!pages[0].forced);
        assert!(pages[1].forced);
    }

    #[test]
    fn forced_break_on_first_block_does_not_open_blank_page() {
        let mut input = items(&[10.0]);
        input[0].force_break_before = true;
        let pages = pack(&input, PackGeometry { page_content_height: 100.0, gap: 0.0 }).unwrap();
        assert_eq!(layout(&pages), vec![vec![0]]);
    }

    #[test]
    fn rejects_bad_geometry() {
        let err = pack(&items(&[1.0]), PackGeometry { page_content_height: 0.0, gap: 0.0 }).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = pack(&items(&[1.0]), PackGeometry { page_content_height: 10.0, gap: f32::NAN }).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
