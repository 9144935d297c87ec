//! Proposal PDF
//!
//! Renders sales proposals and paginates arbitrarily tall HTML views into
//! letter-sized PDF documents without a browser print pipeline.
//!
//! # Pipeline
//!
//! - **Extract**: find the atomic blocks of a laid-out view ([`extract`])
//! - **Rasterize**: render each block to pixels at a fixed width ([`rendering`])
//! - **Pack**: greedily assign blocks to pages, never splitting one ([`packer`])
//! - **Emit**: place the rasters on PDF pages and save the result ([`emit`])
//!
//! # Example
//!
//! ```no_run
//! use proposal_pdf::{ExportConfig, Paginator, RenderedView};
//! use proposal_pdf::emit::DownloadDir;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::default();
//! let paginator = Paginator::with_software_renderer(config)?;
//! let view = RenderedView::from_html(r#"<div data-pdf-block><h1>Hello</h1></div>"#);
//! let saved = paginator.export(&view, "Acme Corp", &DownloadDir::new("out"))?;
//! println!("{} pages", saved.page_count);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod extract;
pub mod packer;
pub mod emit;
pub mod pipeline;
pub mod rendering;
pub mod proposal;

// Worker-thread export controller with the idle/running/done state machine
pub mod async_api;

pub use async_api::{DownloadOutcome, ExportState, Exporter};
pub use emit::PageFooter;
pub use pipeline::{ExportSummary, Paginator};
pub use rendering::{BlockRenderer, RasterImage, RenderedView, SoftwareRenderer};

use rendering::font::FontSet;
use rendering::style::{Color, PX_PER_PT};

/// Page margins in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const fn uniform(pt: f32) -> Self {
        Self { top: pt, right: pt, bottom: pt, left: pt }
    }
}

/// Physical page layout
///
/// Defaults to US Letter (612 x 792 pt) with half-inch margins and a 12 CSS
/// px gap between consecutive blocks on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margins: Margins,
    /// Vertical gap between blocks, in CSS px
    pub block_gap_px: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width_pt: 612.0,
            page_height_pt: 792.0,
            margins: Margins::uniform(36.0),
            block_gap_px: 12.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width_pt(&self) -> f32 {
        self.page_width_pt - self.margins.left - self.margins.right
    }

    pub fn content_height_pt(&self) -> f32 {
        self.page_height_pt - self.margins.top - self.margins.bottom
    }

    /// Width in CSS px that views are laid out at before rasterizing
    pub fn content_width_px(&self) -> f32 {
        self.content_width_pt() * PX_PER_PT
    }
}

/// Configuration for an export pass
///
/// # Examples
///
/// ```
/// let cfg = proposal_pdf::ExportConfig::default();
/// assert_eq!(cfg.density, 2.0);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub geometry: PageGeometry,
    /// Device pixels per CSS px
    pub density: f32,
    /// Opaque fill painted beneath every block
    pub background: Color,
    /// Bound on a whole pass, and on each remote image fetch
    pub timeout_ms: u64,
    /// JPEG quality for embedded rasters (1..=100)
    pub jpeg_quality: u8,
    /// Font file to use instead of system font discovery
    pub font_path: Option<PathBuf>,
    /// Appended to the subject to build the download filename
    pub filename_suffix: String,
    /// Stamped into the bottom margin of every page when set
    pub footer: Option<PageFooter>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            density: 2.0,
            background: Color::WHITE,
            timeout_ms: 30000,
            jpeg_quality: 92,
            font_path: None,
            filename_suffix: "Proposal".to_string(),
            footer: None,
        }
    }
}

impl ExportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.geometry;
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(g.content_width_pt()) || !positive(g.content_height_pt()) {
            return Err(Error::Config(format!(
                "margins leave no content area on a {}x{}pt page",
                g.page_width_pt, g.page_height_pt
            )));
        }
        if !g.block_gap_px.is_finite() || g.block_gap_px < 0.0 {
            return Err(Error::Config(format!("block gap must be non-negative, got {}", g.block_gap_px)));
        }
        if !self.density.is_finite() || self.density < 1.0 {
            return Err(Error::Config(format!("density must be at least 1, got {}", self.density)));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::Config(format!("JPEG quality must be 1..=100, got {}", self.jpeg_quality)));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout must be positive".into()));
        }
        if self.footer.is_some() && g.margins.bottom < PageFooter::HEIGHT_PT {
            return Err(Error::Config(format!(
                "a page footer needs a bottom margin of at least {}pt, got {}",
                PageFooter::HEIGHT_PT,
                g.margins.bottom
            )));
        }
        if self.background.a != 255 {
            return Err(Error::Config("background colour must be opaque".into()));
        }
        Ok(())
    }

    /// Load the configured font file, or discover system fonts.
    pub fn load_fonts(&self) -> Result<FontSet> {
        match &self.font_path {
            Some(path) => FontSet::from_file(path),
            None => Ok(FontSet::system()),
        }
    }
}
