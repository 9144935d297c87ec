//! Page emission: packed pages and block rasters into a PDF, and delivery of
//! the finished bytes to a save destination.

use crate::packer::PackedPage;
use crate::rendering::RasterImage;
use crate::{Error, PageGeometry, Result};
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Points per raster pixel, derived once from the raster width and reused for
/// every height and offset so rounding never accumulates down a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale(pub f32);

impl PixelScale {
    pub fn for_width(geometry: &PageGeometry, raster_width: u32) -> Result<Self> {
        if raster_width == 0 {
            return Err(Error::Emit("raster width is zero".into()));
        }
        Ok(Self(geometry.content_width_pt() / raster_width as f32))
    }

    pub fn to_pt(self, px: f32) -> f32 {
        px * self.0
    }

    pub fn to_px(self, pt: f32) -> f32 {
        pt / self.0
    }
}

/// Fixed footer stamped into the bottom margin of every page: a hairline
/// rule, a brand line on the left and `n / total` on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFooter {
    pub brand: String,
    pub page_numbers: bool,
}

impl PageFooter {
    /// Bottom margin needed to hold the footer, in points
    pub const HEIGHT_PT: f32 = 24.0;
    const FONT_SIZE: f32 = 7.5;
    const RULE_RGB: [f32; 3] = [0.898, 0.906, 0.922];
    const TEXT_RGB: [f32; 3] = [0.612, 0.639, 0.686];

    pub fn new(brand: impl Into<String>) -> Self {
        Self { brand: brand.into(), page_numbers: true }
    }

    fn operations(&self, geometry: &PageGeometry, page_no: usize, total: usize) -> Vec<Operation> {
        let left = geometry.margins.left;
        let right = geometry.page_width_pt - geometry.margins.right;
        let rule_y = geometry.margins.bottom - 10.0;
        let baseline = geometry.margins.bottom - Self::HEIGHT_PT + 2.0;
        let [r, g, b] = Self::RULE_RGB;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new("m", vec![left.into(), rule_y.into()]),
            Operation::new("l", vec![right.into(), rule_y.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        if !self.brand.trim().is_empty() {
            ops.extend(text_ops(&self.brand, left, baseline));
        }
        if self.page_numbers {
            let label = format!("{} / {}", page_no, total);
            ops.extend(text_ops(&label, right - helvetica_width(&label, Self::FONT_SIZE), baseline));
        }
        ops
    }
}

fn text_ops(text: &str, x: f32, baseline: f32) -> Vec<Operation> {
    let [r, g, b] = PageFooter::TEXT_RGB;
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), PageFooter::FONT_SIZE.into()]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new("Tj", vec![Object::String(to_win_ansi(text), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// Advance width of `text` in Helvetica, close enough for right-aligning
/// short numeric labels.
fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | '/' | '.' | ',' => 278,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Assemble the PDF. `pages` index into `rasters`; every raster must share
/// the same pixel width.
pub fn emit_pdf(
    pages: &[PackedPage],
    rasters: &[RasterImage],
    geometry: &PageGeometry,
    scale: PixelScale,
    jpeg_quality: u8,
    footer: Option<&PageFooter>,
) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(Error::NoContent);
    }
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());
    let font_id = footer.map(|_| {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        })
    });

    for (page_no, page) in pages.iter().enumerate() {
        let mut xobjects = lopdf::Dictionary::new();
        let mut ops = Vec::new();
        for slice in &page.slices {
            let raster = rasters
                .get(slice.block)
                .ok_or_else(|| Error::Emit(format!("no raster for block {}", slice.block)))?;
            let name = format!("Im{}", slice.block);
            let image_id = doc.add_object(jpeg_xobject(raster, jpeg_quality)?);
            xobjects.set(name.as_bytes(), image_id);

            let w = scale.to_pt(raster.width as f32);
            let h = scale.to_pt(raster.height as f32);
            let x = geometry.margins.left;
            let top = geometry.margins.top + scale.to_pt(slice.offset);
            let y = geometry.page_height_pt - top - h;
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new(
                "cm",
                vec![w.into(), 0.0f32.into(), 0.0f32.into(), h.into(), x.into(), y.into()],
            ));
            ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            ops.push(Operation::new("Q", vec![]));
        }
        if let Some(footer) = footer {
            ops.extend(footer.operations(geometry, page_no + 1, pages.len()));
        }

        let content = Content { operations: ops }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(geometry.page_width_pt),
                Object::Real(geometry.page_height_pt),
            ],
            "Contents" => content_id,
            "Resources" => resources(xobjects, font_id),
        });
        log::debug!("emitted page {} with {} blocks", page_no + 1, page.slices.len());
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn resources(xobjects: lopdf::Dictionary, font_id: Option<lopdf::ObjectId>) -> lopdf::Dictionary {
    let mut res = dictionary! { "XObject" => xobjects };
    if let Some(id) = font_id {
        res.set("Font", dictionary! { "F1" => id });
    }
    res
}

fn jpeg_xobject(raster: &RasterImage, quality: u8) -> Result<Stream> {
    let rgb = image::RgbImage::from_raw(raster.width, raster.height, raster.to_rgb())
        .ok_or_else(|| Error::Emit("raster buffer does not match its dimensions".into()))?;
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&rgb)
        .map_err(|e| Error::Emit(format!("JPEG encoding failed: {}", e)))?;
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(raster.width),
        "Height" => i64::from(raster.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8i64,
        "Filter" => "DCTDecode",
    };
    // Already compressed; keep lopdf from deflating it again.
    Ok(Stream::new(dict, jpeg).with_compression(false))
}

/// `<Subject>_<suffix>.pdf`, whitespace runs collapsed to a single `_`.
pub fn download_filename(subject: &str, suffix: &str) -> String {
    let cleaned: String = subject
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { ' ' } else { c })
        .collect();
    let stem = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "Untitled".to_string() } else { stem };
    format!("{}_{}.pdf", stem, suffix)
}

/// Where finished documents go
pub trait DocumentSink {
    /// Persist `bytes` under `filename`, returning where it landed.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves into a directory, atomically: the file only appears once complete.
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for DownloadDir {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        let target = self.dir.join(filename);
        tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
        log::info!("saved {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }
}

/// Keeps saved documents in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl DocumentSink for MemorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| Error::Other("memory sink poisoned".into()))?;
        saved.push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}
