//! Layer compositing
//!
//! Every call to [`Renderer::render`] draws onto its own fresh canvas, so
//! renderers hold no per-item state and can be shared across threads.

use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;

use crate::compose::Composition;
use crate::error::{LayermintError, Result};

/// One image placed on the canvas
#[derive(Debug, Clone, Copy)]
pub struct LayerDraw<'a> {
    pub source: &'a Path,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl<'a> LayerDraw<'a> {
    /// Draw list for a composition, in layer order.
    pub fn from_composition(composition: &Composition<'a>) -> Vec<LayerDraw<'a>> {
        composition
            .choices
            .iter()
            .map(|choice| LayerDraw {
                source: &choice.element.path,
                x: choice.layer.position.x,
                y: choice.layer.position.y,
                width: choice.layer.size.width,
                height: choice.layer.size.height,
            })
            .collect()
    }
}

/// Composites layer draws into one encoded raster image
pub trait Renderer: Send + Sync {
    /// Draw `draws` in order onto a `width`x`height` transparent canvas and
    /// return PNG bytes.
    fn render(&self, draws: &[LayerDraw<'_>], width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Renderer backed by the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ImageRenderer {
    filter: Option<FilterType>,
}

impl ImageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resampling filter for layers whose source size differs from the draw size.
    pub fn with_filter(filter: FilterType) -> Self {
        Self {
            filter: Some(filter),
        }
    }

    fn load(&self, draw: &LayerDraw<'_>) -> Result<RgbaImage> {
        let img = image::open(draw.source).map_err(|e| LayermintError::RenderError {
            reason: format!("cannot decode {}", draw.source.display()),
            source: Some(e),
        })?;
        let rgba = img.to_rgba8();

        if rgba.dimensions() == (draw.width, draw.height) {
            return Ok(rgba);
        }

        debug!(
            "Resizing {} from {:?} to {}x{}",
            draw.source.display(),
            rgba.dimensions(),
            draw.width,
            draw.height
        );
        let filter = self.filter.unwrap_or(FilterType::Lanczos3);
        Ok(imageops::resize(&rgba, draw.width, draw.height, filter))
    }
}

impl Renderer for ImageRenderer {
    fn render(&self, draws: &[LayerDraw<'_>], width: u32, height: u32) -> Result<Vec<u8>> {
        if width == 0 || height == 0 {
            return Err(LayermintError::render(format!(
                "canvas must be non-empty, got {}x{}",
                width, height
            )));
        }

        let mut canvas = RgbaImage::new(width, height);

        for draw in draws {
            let layer = self.load(draw)?;
            imageops::overlay(&mut canvas, &layer, draw.x, draw.y);
        }

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| LayermintError::RenderError {
                reason: "cannot encode PNG".to_string(),
                source: Some(e),
            })?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn solid_png(dir: &Path, name: &str, size: u32, color: [u8; 4]) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(size, size, Rgba(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_later_layers_draw_on_top() {
        let dir = TempDir::new().unwrap();
        let red = solid_png(dir.path(), "red.png", 4, [255, 0, 0, 255]);
        let blue = solid_png(dir.path(), "blue.png", 2, [0, 0, 255, 255]);

        let draws = [
            LayerDraw { source: &red, x: 0, y: 0, width: 4, height: 4 },
            LayerDraw { source: &blue, x: 2, y: 2, width: 2, height: 2 },
        ];
        let png = ImageRenderer::new().render(&draws, 4, 4).unwrap();
        let out = image::load_from_memory(&png).unwrap().to_rgba8();

        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_resizes_to_draw_size() {
        let dir = TempDir::new().unwrap();
        let green = solid_png(dir.path(), "green.png", 1, [0, 255, 0, 255]);

        let draws = [LayerDraw { source: &green, x: 0, y: 0, width: 3, height: 3 }];
        let png = ImageRenderer::with_filter(FilterType::Nearest)
            .render(&draws, 3, 3)
            .unwrap();
        let out = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| *p == Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn test_fresh_canvas_per_call() {
        let dir = TempDir::new().unwrap();
        let red = solid_png(dir.path(), "red.png", 2, [255, 0, 0, 255]);
        let renderer = ImageRenderer::new();

        let draws = [LayerDraw { source: &red, x: 0, y: 0, width: 2, height: 2 }];
        renderer.render(&draws, 2, 2).unwrap();

        let png = renderer.render(&[], 2, 2).unwrap();
        let out = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_zero_canvas_rejected() {
        assert!(ImageRenderer::new().render(&[], 0, 4).is_err());
    }

    #[test]
    fn test_undecodable_layer_is_render_error() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();

        let draws = [LayerDraw { source: &broken, x: 0, y: 0, width: 1, height: 1 }];
        let err = ImageRenderer::new().render(&draws, 1, 1).unwrap_err();
        assert_eq!(err.error_code(), "RENDER_ERROR");
    }
}
