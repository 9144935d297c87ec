/// Software rasterizer for pagination blocks

use crate::extract::Block;
use crate::rendering::font::FontSet;
use crate::rendering::layout::Fragment;
use crate::rendering::paint::{paint_subtree, PaintCommand};
use crate::rendering::resource::{LoadError, ResourceLoader};
use crate::rendering::style::Color;
use crate::rendering::{BlockRenderer, RasterImage, RenderedView};
use crate::{Error, ExportConfig, Result};
use std::sync::Arc;
use std::time::Instant;
use tiny_skia::{FillRule, FilterQuality, Paint, Pattern, Pixmap, Rect as SkRect, SpreadMode, Transform};

/// Renders blocks with tiny-skia at a fixed width and density over an
/// opaque background.
pub struct SoftwareRenderer {
    content_width: f32,
    density: f32,
    background: Color,
    fonts: Arc<FontSet>,
    loader: ResourceLoader,
}

impl SoftwareRenderer {
    pub fn new(config: &ExportConfig, fonts: Arc<FontSet>) -> Self {
        Self {
            content_width: config.geometry.content_width_px(),
            density: config.density,
            background: config.background,
            fonts,
            loader: ResourceLoader::new(config.timeout()),
        }
    }

    /// Raster width in device pixels, identical for every block
    pub fn pixel_width(&self) -> u32 {
        (self.content_width * self.density).ceil() as u32
    }

    fn paint(
        &self,
        pixmap: &mut Pixmap,
        cmd: &PaintCommand,
        ts: Transform,
        deadline: Instant,
    ) -> std::result::Result<(), LoadError> {
        match cmd {
            PaintCommand::SolidRect { rect, color } => {
                if let Some(r) = SkRect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
                    pixmap.fill_rect(r, &solid(*color), ts, None);
                }
            }
            PaintCommand::Text { x, baseline, text, size, bold, color } => {
                if let Some(path) = self.fonts.outline(text, *size, *bold, *x, *baseline) {
                    pixmap.fill_path(&path, &solid(*color), FillRule::Winding, ts, None);
                }
            }
            PaintCommand::Image { rect, src } => {
                let Some(target) = SkRect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
                    return Ok(());
                };
                let bytes = self.loader.load(src, deadline)?;
                let img = decode_image(&bytes).ok_or_else(|| LoadError::Read {
                    src: src.chars().take(64).collect(),
                    reason: "undecodable image data".into(),
                })?;
                let sx = rect.width / img.width() as f32;
                let sy = rect.height / img.height() as f32;
                let mut paint = Paint::default();
                paint.shader = Pattern::new(
                    img.as_ref(),
                    SpreadMode::Pad,
                    FilterQuality::Bilinear,
                    1.0,
                    Transform::from_row(sx, 0.0, 0.0, sy, rect.x, rect.y),
                );
                pixmap.fill_rect(target, &paint, ts, None);
            }
        }
        Ok(())
    }
}

impl BlockRenderer for SoftwareRenderer {
    fn rasterize(&self, fragment: &Fragment, block: &Block, index: usize, deadline: Instant) -> Result<RasterImage> {
        let width = self.pixel_width();
        let height = (block.height() * self.density).ceil() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| Error::Raster {
            index,
            reason: format!("cannot allocate a {}x{} raster", width, height),
        })?;
        let bg = self.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, 255));

        // Scale to device pixels and move the block's top edge to y = 0.
        let ts = Transform::from_row(
            self.density,
            0.0,
            0.0,
            self.density,
            0.0,
            -block.vertical_start * self.density,
        );
        for cmd in paint_subtree(fragment, block.node) {
            self.paint(&mut pixmap, &cmd, ts, deadline).map_err(|e| match e {
                LoadError::Timeout(src) => {
                    log::error!("block {} ran out of time fetching {}", index, src);
                    Error::Timeout(self.loader.timeout().as_millis() as u64)
                }
                other => Error::Raster { index, reason: other.to_string() },
            })?;
        }

        log::debug!("rasterized block {} as {}x{}", index, width, height);
        Ok(RasterImage { width, height, pixels: demultiply(pixmap.take()) })
    }

    fn content_width(&self) -> f32 {
        self.content_width
    }

    fn fonts(&self) -> &FontSet {
        &self.fonts
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Background is opaque, so only partially covered edge pixels need work.
fn demultiply(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        if a != 255 && a != 0 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * 255 + a as u16 / 2) / a as u16).min(255) as u8;
            }
        }
    }
    data
}

fn decode_image(data: &[u8]) -> Option<Pixmap> {
    let rgba = image::load_from_memory(data).ok()?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in rgba.as_raw().chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let a = src[3];
        dst[0] = premul(src[0], a);
        dst[1] = premul(src[1], a);
        dst[2] = premul(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premul(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// A detached copy of a view, laid out at the raster content width.
///
/// Exclusively owned by one pagination pass and released when dropped,
/// whichever way the pass ends.
pub struct OffscreenClone {
    fragment: Fragment,
}

impl OffscreenClone {
    pub fn acquire(view: &RenderedView, width: f32, fonts: &FontSet) -> Self {
        let mut fragment = view.fragment().clone();
        fragment.layout(width, fonts);
        log::debug!(
            "offscreen clone acquired: {} nodes, {:.1}px tall at {:.1}px",
            fragment.len(),
            fragment.height(),
            width
        );
        Self { fragment }
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }
}

impl Drop for OffscreenClone {
    fn drop(&mut self) {
        log::debug!("offscreen clone released ({} nodes)", self.fragment.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_blocks;
    use base64::Engine as _;

    fn renderer() -> SoftwareRenderer {
        let config = ExportConfig::default();
        SoftwareRenderer::new(&config, Arc::new(FontSet::empty()))
    }

    fn later() -> Instant {
        Instant::now() + std::time::Duration::from_secs(30)
    }

    fn png_data_uri(color: [u8; 4]) -> String {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(color));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    #[test]
    fn raster_height_rounds_up() {
        let r = renderer();
        let view = RenderedView::from_html(r#"<div data-pdf-block style="height: 10.3px"></div>"#);
        let clone = OffscreenClone::acquire(&view, r.content_width(), r.fonts());
        let blocks = extract_blocks(clone.fragment()).unwrap();
        let img = r.rasterize(clone.fragment(), &blocks[0], 0, later()).unwrap();
        assert_eq!(img.width, r.pixel_width());
        assert_eq!(img.height, 21); // 10.3 * 2 = 20.6
    }

    #[test]
    fn paints_background_over_white() {
        let r = renderer();
        let view = RenderedView::from_html(
            r#"<div data-pdf-block style="height: 20px"><div style="background: #2563eb; width: 10px; height: 10px"></div></div>"#,
        );
        let clone = OffscreenClone::acquire(&view, r.content_width(), r.fonts());
        let blocks = extract_blocks(clone.fragment()).unwrap();
        let img = r.rasterize(clone.fragment(), &blocks[0], 0, later()).unwrap();
        assert_eq!(img.pixel(5, 5), Some([0x25, 0x63, 0xeb, 255]));
        assert_eq!(img.pixel(30, 30), Some([255, 255, 255, 255]));
    }

    #[test]
    fn block_content_is_translated_to_origin() {
        let r = renderer();
        let view = RenderedView::from_html(
            r#"<div data-pdf-block style="height: 100px"></div>
               <div data-pdf-block style="height: 20px; background: #000"></div>"#,
        );
        let clone = OffscreenClone::acquire(&view, r.content_width(), r.fonts());
        let blocks = extract_blocks(clone.fragment()).unwrap();
        let img = r.rasterize(clone.fragment(), &blocks[1], 1, later()).unwrap();
        assert_eq!(img.height, 40);
        assert_eq!(img.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(img.pixel(0, 39), Some([0, 0, 0, 255]));
    }

    #[test]
    fn draws_data_uri_images() {
        let r = renderer();
        let html = format!(
            r#"<div data-pdf-block><img src="{}" width="8" height="8"></div>"#,
            png_data_uri([255, 0, 0, 255])
        );
        let view = RenderedView::from_html(&html);
        let clone = OffscreenClone::acquire(&view, r.content_width(), r.fonts());
        let blocks = extract_blocks(clone.fragment()).unwrap();
        let img = r.rasterize(clone.fragment(), &blocks[0], 0, later()).unwrap();
        assert_eq!(img.pixel(8, 8), Some([255, 0, 0, 255]));
    }

    #[test]
    fn unsupported_image_fails_with_block_index() {
        let r = renderer();
        let view = RenderedView::from_html(
            r#"<div data-pdf-block><img src="ftp://cdn.example.com/logo.png" width="8" height="8"></div>"#,
        );
        let clone = OffscreenClone::acquire(&view, r.content_width(), r.fonts());
        let blocks = extract_blocks(clone.fragment()).unwrap();
        let err = r.rasterize(clone.fragment(), &blocks[0], 4, later()).unwrap_err();
        assert!(matches!(err, Error::Raster { index: 4, .. }));
    }
}
