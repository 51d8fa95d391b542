//! Rasterized PDF export
//!
//! The document is laid out as a fixed-width column, rendered to one tall
//! bitmap and cut into A4 pages, each page embedding its slice as an image.
//!
//! # Architecture
//!
//! - `layout.rs` - blocks to an off-screen SVG column
//! - `raster.rs` - rendering engine acquisition and rasterization (resvg)
//! - `slice.rs` - A4 page slicing of the rendered canvas
//! - `assemble.rs` - PDF document assembly (lopdf)

mod assemble;
mod layout;
mod raster;
mod slice;

pub use assemble::{assemble_pdf, A4_HEIGHT_PT, A4_WIDTH_PT};
pub use layout::{layout_document, FontFamilies, LaidOutDocument, PageLayout};
pub use raster::{EngineProvider, Rasterizer, ResvgEngineProvider, ResvgRasterizer};
pub use slice::{page_count, slice_height, slice_pages, PageSlice};

use super::{Artifact, ArtifactSink, ExportFormat};
use crate::config::PdfSettings;
use crate::error::{Error, Result};
use crate::markdown::blocks_from_html;
use crate::resources::ResourceLoader;
use crate::sanitize::sanitize;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Renders HTML to a paginated PDF.
///
/// The rendering engine is acquired on first use and kept for the lifetime
/// of the exporter. A failed acquisition is not cached.
pub struct PdfExporter {
    provider: Box<dyn EngineProvider>,
    engine: Mutex<Option<Arc<dyn Rasterizer>>>,
    layout: PageLayout,
}

impl PdfExporter {
    /// Exporter backed by resvg, configured from settings.
    pub fn new(settings: &PdfSettings) -> Self {
        Self::with_provider(
            Box::new(ResvgEngineProvider::new(settings.font_url.clone())),
            PageLayout::from(settings),
        )
    }

    pub fn with_provider(provider: Box<dyn EngineProvider>, layout: PageLayout) -> Self {
        Self {
            provider,
            engine: Mutex::new(None),
            layout,
        }
    }

    /// The rendering engine, acquiring it if needed.
    pub fn engine(&self, loader: &ResourceLoader) -> Result<Arc<dyn Rasterizer>> {
        let mut cached = self
            .engine
            .lock()
            .map_err(|_| Error::EngineUnavailable("engine cache poisoned".to_string()))?;
        if let Some(engine) = cached.as_ref() {
            return Ok(Arc::clone(engine));
        }

        debug!("Acquiring PDF rendering engine");
        let engine = self.provider.acquire(loader)?;
        *cached = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Render `html` to PDF bytes.
    pub fn render(&self, html: &str, loader: &ResourceLoader) -> Result<Vec<u8>> {
        let engine = self.engine(loader)?;

        let blocks = blocks_from_html(&sanitize(html));
        let document = layout_document(&blocks, &self.layout, engine.fonts());
        let canvas = engine.rasterize(&document, self.layout.scale)?;
        let slices = slice_pages(&canvas);
        info!(
            "Rendered {}x{} canvas into {} page(s)",
            canvas.width(),
            canvas.height(),
            slices.len()
        );

        assemble_pdf(&slices)
    }

    /// Render `html` and save it as `{filename}.pdf`.
    pub fn export(
        &self,
        html: &str,
        filename: &str,
        loader: &ResourceLoader,
        sink: &dyn ArtifactSink,
    ) -> Result<PathBuf> {
        let bytes = self.render(html, loader)?;
        sink.save(&Artifact::new(filename, ExportFormat::Pdf, bytes))
    }
}
