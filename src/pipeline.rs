//! The synchronous export pass: extract, rasterize, pack, emit, save.
//!
//! A pass owns its offscreen clone, rasters and packed pages; nothing
//! survives it except the saved document. Any failure aborts the pass before
//! the sink is touched.

use crate::emit::{download_filename, emit_pdf, DocumentSink, PixelScale};
use crate::extract::{extract_blocks, Block};
use crate::packer::{pack, PackGeometry, PackItem, PackedPage};
use crate::rendering::{BlockRenderer, OffscreenClone, RasterImage, RenderedView, SoftwareRenderer};
use crate::{Error, ExportConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Blocks, their rasters and the page assignment for one view.
///
/// Heights and offsets in `pages` are device pixels of the rasters.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub blocks: Vec<Block>,
    pub rasters: Vec<RasterImage>,
    pub pages: Vec<PackedPage>,
    pub scale: PixelScale,
}

/// A finished, not yet saved, PDF
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub filename: String,
    pub page_count: usize,
    pub byte_len: usize,
}

pub struct Paginator<R: BlockRenderer> {
    config: ExportConfig,
    renderer: R,
}

impl Paginator<SoftwareRenderer> {
    /// Paginator over the built-in renderer, loading fonts per `config`.
    pub fn with_software_renderer(config: ExportConfig) -> Result<Self> {
        let fonts = Arc::new(config.load_fonts()?);
        let renderer = SoftwareRenderer::new(&config, fonts);
        Self::new(config, renderer)
    }
}

impl<R: BlockRenderer> Paginator<R> {
    pub fn new(config: ExportConfig, renderer: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, renderer })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Extract, rasterize and pack `view` without emitting anything.
    pub fn prepare(&self, view: &RenderedView) -> Result<PreparedDocument> {
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let clone = OffscreenClone::acquire(view, self.renderer.content_width(), self.renderer.fonts());

        let blocks = logged("extract", extract_blocks(clone.fragment()))?;

        let mut rasters = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            if Instant::now() > deadline {
                log::error!("pagination timed out before block {} of {}", index, blocks.len());
                return Err(Error::Timeout(self.config.timeout_ms));
            }
            let raster = logged("rasterize", self.renderer.rasterize(clone.fragment(), block, index, deadline))?;
            if let Some(first) = rasters.first().map(|r: &RasterImage| r.width) {
                if first != raster.width {
                    return logged(
                        "rasterize",
                        Err(Error::Raster {
                            index,
                            reason: format!("raster width {} differs from {}", raster.width, first),
                        }),
                    );
                }
            }
            rasters.push(raster);
        }
        if Instant::now() > deadline {
            log::error!("pagination timed out after rasterizing {} blocks", blocks.len());
            return Err(Error::Timeout(self.config.timeout_ms));
        }
        drop(clone);

        let raster_width = rasters.first().map(|r| r.width).unwrap_or(0);
        let scale = logged("emit", PixelScale::for_width(&self.config.geometry, raster_width))?;
        let geometry = PackGeometry {
            page_content_height: scale.to_px(self.config.geometry.content_height_pt()),
            gap: self.config.geometry.block_gap_px * self.config.density,
        };
        let items: Vec<PackItem> = blocks
            .iter()
            .zip(&rasters)
            .map(|(block, raster)| PackItem {
                height: raster.height as f32,
                force_break_before: block.force_break_before,
            })
            .collect();
        let pages = logged("pack", pack(&items, geometry))?;

        log::debug!(
            "prepared {} blocks onto {} pages in {:?}",
            blocks.len(),
            pages.len(),
            started.elapsed()
        );
        Ok(PreparedDocument { blocks, rasters, pages, scale })
    }

    /// Produce the PDF for `view`.
    pub fn render(&self, view: &RenderedView) -> Result<PdfDocument> {
        let prepared = self.prepare(view)?;
        let bytes = logged(
            "emit",
            emit_pdf(
                &prepared.pages,
                &prepared.rasters,
                &self.config.geometry,
                prepared.scale,
                self.config.jpeg_quality,
                self.config.footer.as_ref(),
            ),
        )?;
        Ok(PdfDocument { bytes, page_count: prepared.pages.len() })
    }

    /// Produce the PDF for `view` and save it as `<subject>_<suffix>.pdf`.
    pub fn export(&self, view: &RenderedView, subject: &str, sink: &dyn DocumentSink) -> Result<ExportSummary> {
        let document = self.render(view)?;
        let filename = download_filename(subject, &self.config.filename_suffix);
        let path = logged("save", sink.save(&filename, &document.bytes))?;
        log::info!(
            "exported {} ({} pages, {} bytes)",
            filename,
            document.page_count,
            document.bytes.len()
        );
        Ok(ExportSummary {
            path,
            filename,
            page_count: document.page_count,
            byte_len: document.bytes.len(),
        })
    }
}

fn logged<T>(stage: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        log::error!("pagination failed at {}: {}", stage, e);
    }
    result
}
