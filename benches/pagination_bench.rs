use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proposal_pdf::packer::{pack, PackGeometry, PackItem};
use proposal_pdf::rendering::font::FontSet;
use proposal_pdf::{ExportConfig, Paginator, RenderedView, SoftwareRenderer};
use std::sync::Arc;

/// Bench: greedy packing of a long block list
fn bench_pack(c: &mut Criterion) {
    let items: Vec<PackItem> = (0..2000)
        .map(|i| PackItem {
            height: 40.0 + (i * 37 % 500) as f32,
            force_break_before: i % 97 == 0,
        })
        .collect();
    let geometry = PackGeometry { page_content_height: 1920.0, gap: 24.0 };

    c.bench_function("pack_2000_blocks", |b| {
        b.iter(|| pack(black_box(&items), geometry).unwrap())
    });
}

/// Bench: full prepare pass (layout, extract, rasterize, pack) without emitting
fn bench_prepare(c: &mut Criterion) {
    let html: String = (0..20)
        .map(|i| {
            format!(
                r#"<section data-pdf-block style="padding: 16px; background: #f9fafb; border: 1px solid #e5e7eb"><h2>Section {}</h2><p>Deliverables and scope for this phase of the engagement.</p></section>"#,
                i
            )
        })
        .collect();
    let view = RenderedView::from_html(&html);
    let config = ExportConfig::default();
    let renderer = SoftwareRenderer::new(&config, Arc::new(FontSet::empty()));
    let paginator = Paginator::new(config, renderer).unwrap();

    c.bench_function("prepare_20_sections", |b| {
        b.iter(|| paginator.prepare(black_box(&view)).unwrap())
    });
}

criterion_group!(benches, bench_pack, bench_prepare);
criterion_main!(benches);
