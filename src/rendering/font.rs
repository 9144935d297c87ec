//! Font discovery, text measurement and glyph outlines.

use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Path as SkPath, PathBuilder};
use ttf_parser::OutlineBuilder;

/// Fallback advance, in em, used when no font is available
const ESTIMATED_ADVANCE_EM: f32 = 0.5;

/// Ascent, in em, used to place a baseline inside a line box
pub const ASCENT_EM: f32 = 0.8;

#[derive(Clone)]
struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl FontFace {
    fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

/// A regular and a bold face shared by layout and rasterization.
///
/// Immutable once built, so one set may be reused by every pagination pass.
#[derive(Clone, Default)]
pub struct FontSet {
    regular: Option<FontFace>,
    bold: Option<FontFace>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl FontSet {
    /// A set without faces; text is measured by estimate and not drawn.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Discover a sans-serif regular/bold pair among the system fonts.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let set = Self {
            regular: query_face(&db, fontdb::Weight::NORMAL),
            bold: query_face(&db, fontdb::Weight::BOLD),
        };
        if set.regular.is_none() {
            log::warn!("no system font found; text will not be rendered");
        }
        set
    }

    /// Load one font file, used for both weights.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_font_file(path)?;
        let id = db
            .faces()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| Error::Config(format!("no font face in {}", path.display())))?;
        let face = load_face(&db, id)
            .ok_or_else(|| Error::Config(format!("unreadable font {}", path.display())))?;
        Ok(Self { regular: Some(face.clone()), bold: Some(face) })
    }

    pub fn has_glyphs(&self) -> bool {
        self.regular.is_some()
    }

    fn face(&self, bold: bool) -> Option<&FontFace> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }
    }

    /// Advance width of `text` in px at `size` px.
    pub fn measure(&self, text: &str, size: f32, bold: bool) -> f32 {
        let Some(face) = self.face(bold).and_then(FontFace::parse) else {
            return text.chars().count() as f32 * size * ESTIMATED_ADVANCE_EM;
        };
        let scale = size / f32::from(face.units_per_em().max(1));
        text.chars()
            .map(|ch| match face.glyph_index(ch) {
                Some(gid) => f32::from(face.glyph_hor_advance(gid).unwrap_or(0)) * scale,
                None => size * ESTIMATED_ADVANCE_EM,
            })
            .sum()
    }

    /// Outline of `text` with its baseline starting at (`x`, `baseline`).
    ///
    /// Returns `None` when there is no font or nothing to draw.
    pub fn outline(&self, text: &str, size: f32, bold: bool, x: f32, baseline: f32) -> Option<SkPath> {
        let face = self.face(bold)?.parse()?;
        let scale = size / f32::from(face.units_per_em().max(1));
        let mut builder = GlyphPathBuilder { builder: PathBuilder::new(), origin_x: x, origin_y: baseline, scale };
        for ch in text.chars() {
            match face.glyph_index(ch) {
                Some(gid) => {
                    face.outline_glyph(gid, &mut builder);
                    builder.origin_x += f32::from(face.glyph_hor_advance(gid).unwrap_or(0)) * scale;
                }
                None => builder.origin_x += size * ESTIMATED_ADVANCE_EM,
            }
        }
        builder.builder.finish()
    }
}

fn query_face(db: &fontdb::Database, weight: fontdb::Weight) -> Option<FontFace> {
    let families = [
        fontdb::Family::SansSerif,
        fontdb::Family::Name("Inter"),
        fontdb::Family::Name("DejaVu Sans"),
        fontdb::Family::Name("Liberation Sans"),
        fontdb::Family::Name("Noto Sans"),
    ];
    let query = fontdb::Query {
        families: &families,
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
    load_face(db, id)
}

fn load_face(db: &fontdb::Database, id: fontdb::ID) -> Option<FontFace> {
    db.with_face_data(id, |data, index| FontFace { data: Arc::new(data.to_vec()), index })
}

/// Glyph outlines are y-up in font units; raster space is y-down in px.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_estimates_advances() {
        let fonts = FontSet::empty();
        assert!(!fonts.has_glyphs());
        assert_eq!(fonts.measure("abcd", 10.0, false), 20.0);
        assert!(fonts.outline("abcd", 10.0, false, 0.0, 10.0).is_none());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let err = FontSet::from_file(Path::new("/definitely/not/a/font.ttf")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
