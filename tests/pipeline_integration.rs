use proposal_pdf::emit::{DownloadDir, MemorySink};
use proposal_pdf::extract::Block;
use proposal_pdf::rendering::font::FontSet;
use proposal_pdf::rendering::Fragment;
use proposal_pdf::{BlockRenderer, Error, ExportConfig, Paginator, RasterImage, RenderedView, SoftwareRenderer};
use std::cell::RefCell;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Produces flat grey rasters of the right size and records what it was asked for.
struct RecordingRenderer {
    fonts: FontSet,
    fail_at: Option<usize>,
    delay: Duration,
    calls: RefCell<Vec<usize>>,
}

impl RecordingRenderer {
    fn new(fail_at: Option<usize>) -> Self {
        Self { fonts: FontSet::empty(), fail_at, delay: Duration::ZERO, calls: RefCell::new(Vec::new()) }
    }

    fn slow(delay: Duration) -> Self {
        Self { delay, ..Self::new(None) }
    }
}

impl BlockRenderer for RecordingRenderer {
    fn rasterize(
        &self,
        _fragment: &Fragment,
        block: &Block,
        index: usize,
        _deadline: Instant,
    ) -> proposal_pdf::Result<RasterImage> {
        self.calls.borrow_mut().push(index);
        std::thread::sleep(self.delay);
        if self.fail_at == Some(index) {
            return Err(Error::Raster { index, reason: "image blocked".into() });
        }
        let width = 1440;
        let height = (block.height() * 2.0).ceil() as u32;
        Ok(RasterImage { width, height, pixels: vec![128; (width * height * 4) as usize] })
    }

    fn content_width(&self) -> f32 {
        720.0
    }

    fn fonts(&self) -> &FontSet {
        &self.fonts
    }
}

fn blocks_html(heights: &[u32]) -> String {
    heights
        .iter()
        .map(|h| format!(r#"<div data-pdf-block style="height: {}px"></div>"#, h))
        .collect()
}

#[test]
fn tall_document_spreads_over_pages_in_order() {
    // Page content height is 960 CSS px; 12px gaps.
    let view = RenderedView::from_html(&blocks_html(&[500, 400, 300, 900, 100]));
    let paginator = Paginator::new(ExportConfig::default(), RecordingRenderer::new(None)).unwrap();
    let prepared = paginator.prepare(&view).unwrap();
    let pages: Vec<Vec<usize>> = prepared.pages.iter().map(|p| p.blocks().collect()).collect();
    assert_eq!(pages, vec![vec![0, 1], vec![2], vec![3], vec![4]]);
    assert_eq!(*paginator_calls(&paginator), vec![0, 1, 2, 3, 4]);
}

fn paginator_calls(p: &Paginator<RecordingRenderer>) -> std::cell::Ref<'_, Vec<usize>> {
    p.renderer().calls.borrow()
}

#[test]
fn saves_one_document_under_subject_name() {
    let sink = MemorySink::new();
    let paginator = Paginator::new(ExportConfig::default(), RecordingRenderer::new(None)).unwrap();
    let summary = paginator
        .export(&RenderedView::from_html(&blocks_html(&[100, 100])), "Cobalt  Labs", &sink)
        .unwrap();
    assert_eq!(summary.filename, "Cobalt_Labs_Proposal.pdf");
    assert_eq!(summary.page_count, 1);

    let saved = sink.saved();
    assert_eq!(saved.len(), 1);
    let doc = lopdf::Document::load_mem(&saved[0].1).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn raster_failure_aborts_without_saving() {
    let sink = MemorySink::new();
    let paginator = Paginator::new(ExportConfig::default(), RecordingRenderer::new(Some(1))).unwrap();
    let err = paginator
        .export(&RenderedView::from_html(&blocks_html(&[100, 100, 100])), "Acme", &sink)
        .unwrap_err();
    assert!(matches!(err, Error::Raster { index: 1, .. }));
    assert!(err.is_retryable());
    assert!(sink.saved().is_empty());
    // Block 2 is never attempted once block 1 fails.
    assert_eq!(*paginator_calls(&paginator), vec![0, 1]);
}

#[test]
fn pass_deadline_stops_before_next_block() {
    let sink = MemorySink::new();
    let config = ExportConfig { timeout_ms: 200, ..Default::default() };
    let paginator = Paginator::new(config, RecordingRenderer::slow(Duration::from_millis(150))).unwrap();
    let err = paginator
        .export(&RenderedView::from_html(&blocks_html(&[100, 100, 100])), "Acme", &sink)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(200)));
    assert!(err.is_retryable());
    assert!(sink.saved().is_empty());
    assert_eq!(*paginator_calls(&paginator), vec![0, 1]);
}

#[test]
fn pass_deadline_applies_after_last_block() {
    let sink = MemorySink::new();
    let config = ExportConfig { timeout_ms: 100, ..Default::default() };
    let paginator = Paginator::new(config, RecordingRenderer::slow(Duration::from_millis(250))).unwrap();
    let err = paginator
        .export(&RenderedView::from_html(&blocks_html(&[100])), "Acme", &sink)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(100)));
    assert!(sink.saved().is_empty());
}

#[test]
fn no_content_produces_no_document() {
    let sink = MemorySink::new();
    let paginator = Paginator::new(ExportConfig::default(), RecordingRenderer::new(None)).unwrap();
    let err = paginator.export(&RenderedView::from_html(""), "Acme", &sink).unwrap_err();
    assert!(matches!(err, Error::NoContent));
    assert!(!err.is_retryable());
    assert!(sink.saved().is_empty());
    assert!(paginator_calls(&paginator).is_empty());
}

#[test]
fn software_rasters_are_deterministic() {
    let config = ExportConfig::default();
    let renderer = SoftwareRenderer::new(&config, Arc::new(FontSet::empty()));
    let paginator = Paginator::new(config, renderer).unwrap();
    let view = RenderedView::from_html(
        r#"<div data-pdf-block style="padding: 12px; background: #eff6ff; border: 2px solid #2563eb">
             <div style="height: 40px; background: #16a34a"></div>
           </div>
           <div data-pdf-block style="height: 30px; background: #f9fafb"></div>"#,
    );
    let first = paginator.prepare(&view).unwrap();
    let second = paginator.prepare(&view).unwrap();
    let digests = |p: &proposal_pdf::pipeline::PreparedDocument| -> Vec<String> {
        p.rasters.iter().map(|r| r.digest()).collect()
    };
    assert_eq!(digests(&first), digests(&second));
    assert_eq!(first.pages, second.pages);
    assert!(first.rasters.iter().all(|r| r.width == 1440));
}

#[test]
fn download_dir_receives_the_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig { filename_suffix: "SOW".into(), ..Default::default() };
    let renderer = SoftwareRenderer::new(&config, Arc::new(FontSet::empty()));
    let paginator = Paginator::new(config, renderer).unwrap();
    let summary = paginator
        .export(
            &RenderedView::from_html(&blocks_html(&[200, 800, 50])),
            "Acme",
            &DownloadDir::new(dir.path()),
        )
        .unwrap();
    assert_eq!(summary.path, dir.path().join("Acme_SOW.pdf"));
    assert_eq!(summary.page_count, 2);
    let bytes = std::fs::read(&summary.path).unwrap();
    assert_eq!(bytes.len(), summary.byte_len);
    assert!(bytes.starts_with(b"%PDF"));
}
