use image::{ImageEncoder, RgbImage};
use mupdf::{Colorspace, Matrix};

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::config::RenderConfig;
use crate::error::{Error, Result};

/// A rasterized page, JPEG-encoded.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number
    pub page_number: usize,
    pub jpeg: Vec<u8>,
    /// Pixel dimensions of the image
    pub width_px: u32,
    pub height_px: u32,
    /// Native page size in points
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Something that can turn a page into a background image.
///
/// Implementations must hold no mutable state: the reconstructor and ad hoc
/// exports call them concurrently.
pub trait Rasterize: Send + Sync {
    fn rasterize(&self, doc: &PdfDocument, page_number: usize) -> Result<RasterPage>;
}

/// MuPDF-backed page rasterizer.
#[derive(Debug, Clone, Copy)]
pub struct PageRasterizer {
    /// Scale factor for rendering
    pub scale: f32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl PageRasterizer {
    pub const fn from_config(config: &RenderConfig) -> Self {
        Self {
            scale: config.scale,
            quality: config.jpeg_quality,
        }
    }

    /// Create a rasterizer with custom scale
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Render a page to an RGB image buffer, plus its native size in points.
    pub fn render_page(&self, doc: &PdfDocument, page_number: usize) -> Result<(RgbImage, f32, f32)> {
        let page_index = PageIndex::from_page_number(page_number, doc.page_count()).map_err(|e| {
            Error::Render {
                page: page_number,
                reason: e.to_string(),
            }
        })?;
        let render_error = |reason: String| Error::Render {
            page: page_number,
            reason,
        };

        let mu_doc = doc
            .open_document()
            .map_err(|e| render_error(e.to_string()))?;
        let page = mu_doc
            .load_page(page_index.into())
            .map_err(|e| render_error(format!("failed to load page: {e}")))?;

        let bounds = page
            .bounds()
            .map_err(|e| render_error(format!("failed to get bounds: {e}")))?;

        let matrix = Matrix::new_scale(self.scale, self.scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| render_error(format!("failed to render: {e}")))?;

        let width = pixmap.width();
        let height = pixmap.height();
        let n = pixmap.n() as usize; // components per pixel
        let samples = pixmap.samples();
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);

        for px in samples.chunks(n) {
            match n {
                3 => rgb.extend_from_slice(px),
                // Premultiplied alpha: composite onto white
                4 => {
                    let backdrop = 255 - px[3];
                    rgb.extend(px[..3].iter().map(|c| c.saturating_add(backdrop)));
                }
                1 => rgb.extend_from_slice(&[px[0], px[0], px[0]]),
                _ => return Err(render_error(format!("unexpected pixel format with {n} components"))),
            }
        }

        let image = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| render_error("failed to create image buffer".to_string()))?;

        Ok((image, bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }
}

impl Rasterize for PageRasterizer {
    fn rasterize(&self, doc: &PdfDocument, page_number: usize) -> Result<RasterPage> {
        let (image, width_pt, height_pt) = self.render_page(doc, page_number)?;

        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| Error::Render {
                page: page_number,
                reason: format!("failed to encode JPEG: {e}"),
            })?;

        Ok(RasterPage {
            page_number,
            jpeg,
            width_px: image.width(),
            height_px: image.height(),
            width_pt,
            height_pt,
        })
    }
}
