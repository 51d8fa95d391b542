//! Rendering engine: font acquisition and SVG rasterization via resvg

use super::layout::{FontFamilies, LaidOutDocument};
use crate::error::{Error, Result};
use crate::resources::ResourceLoader;
use image::RgbaImage;
use log::{debug, info, warn};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::fontdb::Database;
use resvg::usvg::{Options, Tree};
use std::sync::Arc;

/// Turns a laid out document into a bitmap.
pub trait Rasterizer: Send + Sync {
    /// Families the engine can actually draw with.
    fn fonts(&self) -> &FontFamilies;

    /// Render `document` at `scale` device pixels per CSS pixel.
    fn rasterize(&self, document: &LaidOutDocument, scale: f32) -> Result<RgbaImage>;
}

/// Produces a ready rendering engine.
pub trait EngineProvider: Send + Sync {
    fn acquire(&self, loader: &ResourceLoader) -> Result<Arc<dyn Rasterizer>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// resvg Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Proportional families tried, in order, when picking a system font.
const PREFERRED_TEXT_FAMILIES: &[&str] = &[
    "Segoe UI",
    "Helvetica Neue",
    "Roboto",
    "Noto Sans",
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
];

/// Rasterizes SVG with resvg against a fixed font database.
pub struct ResvgRasterizer {
    fontdb: Arc<Database>,
    fonts: FontFamilies,
}

impl ResvgRasterizer {
    /// Build a rasterizer over `db`, choosing text and monospace families.
    ///
    /// `preferred` is used for text when present in the database.
    pub fn new(mut db: Database, preferred: Option<&str>) -> Result<Self> {
        if db.is_empty() {
            return Err(Error::EngineUnavailable("no usable fonts found".to_string()));
        }

        let families: Vec<(String, bool)> = db
            .faces()
            .filter_map(|face| {
                face.families
                    .first()
                    .map(|(name, _)| (name.clone(), face.monospaced))
            })
            .collect();
        let has_family = |wanted: &str| families.iter().any(|(name, _)| name == wanted);

        let text = preferred
            .filter(|name| has_family(name))
            .or_else(|| {
                PREFERRED_TEXT_FAMILIES
                    .iter()
                    .copied()
                    .find(|name| has_family(name))
            })
            .map(str::to_string)
            .or_else(|| {
                families
                    .iter()
                    .find(|(_, mono)| !mono)
                    .or_else(|| families.first())
                    .map(|(name, _)| name.clone())
            })
            .ok_or_else(|| Error::EngineUnavailable("fonts have no family names".to_string()))?;
        let mono = families
            .iter()
            .find(|(_, mono)| *mono)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| text.clone());

        db.set_sans_serif_family(text.clone());
        db.set_monospace_family(mono.clone());
        info!("PDF engine ready: text '{}', code '{}'", text, mono);

        Ok(Self {
            fontdb: Arc::new(db),
            fonts: FontFamilies { text, mono },
        })
    }
}

impl Rasterizer for ResvgRasterizer {
    fn fonts(&self) -> &FontFamilies {
        &self.fonts
    }

    fn rasterize(&self, document: &LaidOutDocument, scale: f32) -> Result<RgbaImage> {
        let options = Options {
            fontdb: self.fontdb.clone(),
            font_family: self.fonts.text.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&document.svg, &options)
            .map_err(|e| Error::Rasterize(format!("SVG parsing error: {}", e)))?;

        let width = (document.width as f32 * scale).round() as u32;
        let height = (document.height as f32 * scale).round() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::Rasterize(format!("cannot allocate a {}x{} bitmap", width, height))
        })?;
        pixmap.fill(Color::WHITE);

        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        debug!("Rasterized document to {}x{}", width, height);

        // Opaque background, so premultiplied and straight alpha agree.
        RgbaImage::from_raw(width, height, pixmap.take())
            .ok_or_else(|| Error::Rasterize("bitmap size mismatch".to_string()))
    }
}

/// Acquires a [`ResvgRasterizer`], loading the configured font if any.
#[derive(Debug, Clone, Default)]
pub struct ResvgEngineProvider {
    font_url: Option<String>,
}

impl ResvgEngineProvider {
    pub fn new(font_url: Option<String>) -> Self {
        Self { font_url }
    }
}

impl EngineProvider for ResvgEngineProvider {
    fn acquire(&self, loader: &ResourceLoader) -> Result<Arc<dyn Rasterizer>> {
        let mut db = Database::new();
        let mut preferred = None;

        if let Some(url) = &self.font_url {
            match loader.load_font(url) {
                Ok(font) => {
                    db.load_font_data(font.content.to_vec());
                    preferred = db
                        .faces()
                        .next()
                        .and_then(|face| face.families.first())
                        .map(|(name, _)| name.clone());
                    if preferred.is_none() {
                        warn!("Font {} is not usable, using system fonts", url);
                    }
                }
                Err(e) => warn!("{}. Using system fonts.", e),
            }
        }

        if preferred.is_none() {
            db.load_system_fonts();
        }

        let rasterizer = ResvgRasterizer::new(db, preferred.as_deref())?;
        Ok(Arc::new(rasterizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::{layout_document, PageLayout};
    use crate::markdown::Block;
    use crate::resources::{Fetch, FetchOptions, FetchResponse, ResourceRegistry};

    fn bare_rasterizer() -> ResvgRasterizer {
        ResvgRasterizer {
            fontdb: Arc::new(Database::new()),
            fonts: FontFamilies::default(),
        }
    }

    #[test]
    fn test_empty_database_is_unavailable() {
        let result = ResvgRasterizer::new(Database::new(), None);
        assert!(matches!(result, Err(Error::EngineUnavailable(_))));
    }

    #[test]
    fn test_rasterize_scales_canvas() {
        let document = LaidOutDocument {
            svg: r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20" viewBox="0 0 10 20"><rect x="0" y="10" width="10" height="10" fill="#000000"/></svg>"##.to_string(),
            width: 10,
            height: 20,
        };

        let image = bare_rasterizer().rasterize(&document, 2.0).unwrap();

        assert_eq!(image.dimensions(), (20, 40));
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(5, 35).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_invalid_svg_is_rasterize_error() {
        let document = LaidOutDocument {
            svg: "not svg".to_string(),
            width: 10,
            height: 10,
        };
        let err = bare_rasterizer().rasterize(&document, 1.0).unwrap_err();
        assert!(matches!(err, Error::Rasterize(_)));
    }

    #[test]
    fn test_control_characters_in_text_still_rasterize() {
        let blocks = [
            Block::Heading {
                level: 1,
                text: "Title\u{1}".to_string(),
            },
            Block::Paragraph("a & b < c \u{1} \u{FFFF} \u{1b}[0m".to_string()),
        ];
        let document = layout_document(&blocks, &PageLayout::default(), &FontFamilies::default());

        let image = bare_rasterizer().rasterize(&document, 1.0).unwrap();
        assert_eq!(image.dimensions(), (document.width, document.height));
    }

    #[test]
    fn test_unusable_font_falls_back_to_system_fonts() {
        struct GarbageFont;
        impl Fetch for GarbageFont {
            fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<FetchResponse> {
                Ok(FetchResponse::ok(b"definitely not a font".to_vec()))
            }
        }

        let loader = ResourceLoader::new(Arc::new(ResourceRegistry::new()), Arc::new(GarbageFont));
        let provider = ResvgEngineProvider::new(Some("https://cdn/font.ttf".to_string()));

        // Either system fonts exist and the engine is built from them, or
        // there are none and acquisition reports the engine as unavailable.
        match provider.acquire(&loader) {
            Ok(engine) => assert!(!engine.fonts().text.is_empty()),
            Err(err) => assert!(matches!(err, Error::EngineUnavailable(_))),
        }
        assert_eq!(loader.registry().loaded_count(), 1);
    }
}
