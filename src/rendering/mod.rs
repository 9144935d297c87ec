//! Rendering: parse, lay out, paint and rasterize document fragments

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod resource;
pub mod style;

use crate::extract::Block;
use crate::Result;
use sha2::{Digest, Sha256};
use std::time::Instant;

pub use layout::{Fragment, NodeId};
pub use raster::{OffscreenClone, SoftwareRenderer};

/// An opaque RGBA8 pixel raster of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Packed RGB bytes (alpha dropped; rasters are painted over an opaque fill)
    pub fn to_rgb(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Content digest, stable across runs for identical input
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }
}

/// A view handed over by the caller once it has fully rendered.
///
/// The pipeline never lays out or paints the view itself; it works on an
/// [`OffscreenClone`] so the caller's copy is left untouched.
#[derive(Debug, Clone)]
pub struct RenderedView {
    fragment: Fragment,
}

impl RenderedView {
    pub fn from_html(html: &str) -> Self {
        Self { fragment: Fragment::parse(html) }
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }
}

/// Rasterizes one block of a laid-out fragment.
///
/// Implementations must produce a raster `ceil(width * density)` pixels wide
/// and `ceil(block height * density)` pixels tall, and give up with
/// [`Error::Timeout`](crate::Error::Timeout) rather than run past `deadline`.
pub trait BlockRenderer {
    fn rasterize(&self, fragment: &Fragment, block: &Block, index: usize, deadline: Instant) -> Result<RasterImage>;

    /// Width in CSS px the fragment must be laid out at before rasterizing
    fn content_width(&self) -> f32;

    /// Fonts used for text measurement during layout
    fn fonts(&self) -> &font::FontSet;
}
