use proposal_pdf::packer::{pack, PackGeometry, PackItem, PackedPage};
use proposal_pdf::Error;
use proptest::prelude::*;

fn items(heights: &[f32]) -> Vec<PackItem> {
    heights
        .iter()
        .map(|&height| PackItem { height, force_break_before: false })
        .collect()
}

fn layout(pages: &[PackedPage]) -> Vec<Vec<usize>> {
    pages.iter().map(|p| p.blocks().collect()).collect()
}

fn to_items(raw: Vec<(f32, bool)>) -> Vec<PackItem> {
    raw.into_iter()
        .map(|(height, force_break_before)| PackItem { height, force_break_before })
        .collect()
}

fn blocks() -> impl Strategy<Value = Vec<PackItem>> {
    prop::collection::vec((1f32..450.0, any::<bool>()), 1..40).prop_map(to_items)
}

#[test]
fn scenario_a_third_block_overflows() {
    let pages = pack(&items(&[100.0, 100.0, 100.0]), PackGeometry { page_content_height: 250.0, gap: 10.0 }).unwrap();
    assert_eq!(layout(&pages), vec![vec![0, 1], vec![2]]);
    assert_eq!(pages[0].consumed, 210.0);
}

#[test]
fn scenario_b_oversized_block_is_never_split() {
    let pages = pack(&items(&[300.0]), PackGeometry { page_content_height: 250.0, gap: 10.0 }).unwrap();
    assert_eq!(layout(&pages), vec![vec![0]]);
    assert_eq!(pages[0].consumed, 300.0);
    assert_eq!(pages[0].slices[0].offset, 0.0);
}

#[test]
fn scenario_c_forced_break_beats_free_space() {
    let mut input = items(&[50.0, 50.0]);
    input[1].force_break_before = true;
    let pages = pack(&input, PackGeometry { page_content_height: 1000.0, gap: 10.0 }).unwrap();
    assert_eq!(layout(&pages), vec![vec![0], vec![1]]);
}

#[test]
fn scenario_d_no_blocks() {
    let err = pack(&[], PackGeometry { page_content_height: 250.0, gap: 10.0 }).unwrap_err();
    assert!(matches!(err, Error::NoContent));
}

#[test]
fn oversized_blocks_sit_alone() {
    let input = items(&[40.0, 600.0, 40.0, 700.0]);
    let pages = pack(&input, PackGeometry { page_content_height: 500.0, gap: 10.0 }).unwrap();
    assert_eq!(layout(&pages), vec![vec![0], vec![1], vec![2], vec![3]]);
}

proptest! {
    #[test]
    fn flattening_reproduces_input_order(input in blocks()) {
        let pages = pack(&input, PackGeometry { page_content_height: 300.0, gap: 12.0 }).unwrap();
        let flat: Vec<usize> = pages.iter().flat_map(|p| p.blocks()).collect();
        prop_assert_eq!(flat, (0..input.len()).collect::<Vec<_>>());
    }

    #[test]
    fn pages_never_exceed_content_height_unless_alone(input in blocks()) {
        let geometry = PackGeometry { page_content_height: 300.0, gap: 12.0 };
        for page in pack(&input, geometry).unwrap() {
            prop_assert!(!page.slices.is_empty());
            if page.consumed > geometry.page_content_height {
                prop_assert_eq!(page.slices.len(), 1, "only a lone oversized block may overflow");
                prop_assert!(page.slices[0].height > geometry.page_content_height);
            }
        }
    }

    #[test]
    fn forced_blocks_always_open_a_page(input in blocks()) {
        let pages = pack(&input, PackGeometry { page_content_height: 500.0, gap: 8.0 }).unwrap();
        for page in &pages {
            for slice in page.slices.iter().skip(1) {
                prop_assert!(!input[slice.block].force_break_before);
            }
        }
    }

    #[test]
    fn offsets_accumulate_height_and_gap(input in blocks()) {
        let geometry = PackGeometry { page_content_height: 800.0, gap: 24.0 };
        for page in pack(&input, geometry).unwrap() {
            let mut expected = 0.0;
            for (i, slice) in page.slices.iter().enumerate() {
                if i > 0 {
                    expected += geometry.gap;
                }
                prop_assert_eq!(slice.offset, expected);
                expected += slice.height;
            }
            prop_assert_eq!(page.consumed, expected);
        }
    }

    #[test]
    fn packing_is_deterministic(input in blocks()) {
        let geometry = PackGeometry { page_content_height: 400.0, gap: 12.0 };
        prop_assert_eq!(pack(&input, geometry).unwrap(), pack(&input, geometry).unwrap());
    }
}
