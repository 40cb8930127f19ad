//! Visual reconstruction of translated pages.
//!
//! # Page Recipe
//!
//! Every output page is built from three layers, bottom to top:
//! 1. the original page, rasterized to JPEG and drawn full-bleed;
//! 2. a white rectangle at `overlay_alpha` opacity covering the page minus a
//!    fixed margin, which hides the original text but lets the page edges
//!    (headers, rules, images near the border) show through;
//! 3. the translated text at full opacity, word-wrapped to the box width.
//!
//! # Coordinate System
//!
//! Layout is computed top-down (distance from the top edge, like a reader
//! would measure it) and converted to PDF's bottom-left origin when the
//! content stream is written:
//! ```text
//! pdf_y = page_height - distance_from_top
//! ```
//!
//! Lines that do not fit in the box are dropped. No continuation page is
//! inserted, so output page count always equals input record count.

use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, warn};

use super::document::PdfDocument;
use super::metrics::{char_width, to_win_ansi};
use super::render::{PageRasterizer, RasterPage, Rasterize};
use crate::checkpoint::Checkpoint;
use crate::config::{AppConfig, LayoutConfig};
use crate::error::{Error, Result};
use crate::page::TranslatedPageRecord;
use crate::progress::{ProgressEvent, ProgressReporter};

// =============================================================================
// Layout Constants
// =============================================================================

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// First baseline, measured from the top of the box (mm).
const FIRST_BASELINE_MM: f32 = 10.0;

/// Free space kept above the bottom edge of the box (mm).
const BOTTOM_GUARD_MM: f32 = 5.0;

/// Horizontal padding between box edge and text (mm).
const TEXT_PADDING_MM: f32 = 2.0;

/// Page size used when the original page cannot be rendered (A4).
const FALLBACK_PAGE_SIZE: (f32, f32) = (595.28, 841.89);

const FONT_NAME: &str = "F1";
const IMAGE_NAME: &str = "Im1";
const WASH_STATE: &str = "GSWash";
const OPAQUE_STATE: &str = "GSOpaque";

// =============================================================================
// Layout
// =============================================================================

/// Text box geometry for one output page, in points.
#[derive(Debug, Clone, Copy)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub line_pitch: f32,
    text_x: f32,
    first_baseline: f32,
    last_baseline: f32,
    /// Line width in glyph units at `font_size`
    line_units: u32,
}

impl PageLayout {
    pub fn new(page_width: f32, page_height: f32, config: &LayoutConfig) -> Self {
        let margin = config.margin_mm * PT_PER_MM;
        let padding = TEXT_PADDING_MM * PT_PER_MM;
        let box_width = (page_width - 2.0 * margin).max(0.0);
        let text_width = (box_width - 2.0 * padding).max(0.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let line_units = (text_width * 1000.0 / config.font_size).floor().max(0.0) as u32;

        Self {
            page_width,
            page_height,
            margin,
            font_size: config.font_size,
            line_pitch: config.line_pitch_mm * PT_PER_MM,
            text_x: margin + padding,
            first_baseline: margin + FIRST_BASELINE_MM * PT_PER_MM,
            last_baseline: page_height - margin - BOTTOM_GUARD_MM * PT_PER_MM,
            line_units,
        }
    }

    /// Width available to one line of text, in points.
    #[allow(clippy::cast_precision_loss)]
    pub fn line_width(&self) -> f32 {
        self.line_units as f32 * self.font_size / 1000.0
    }

    /// Number of lines the box can hold.
    pub fn capacity(&self) -> usize {
        if self.last_baseline < self.first_baseline {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let extra = ((self.last_baseline - self.first_baseline) / self.line_pitch).floor() as usize;
        extra + 1
    }

    /// Wrap `text` to the box and split it into `(kept, dropped_count)`.
    pub fn flow(&self, text: &str) -> (Vec<String>, usize) {
        let mut lines: Vec<String> = text
            .lines()
            .flat_map(|paragraph| word_wrap(paragraph, self.line_units))
            .collect();

        let capacity = self.capacity();
        let dropped = lines.len().saturating_sub(capacity);
        lines.truncate(capacity);
        (lines, dropped)
    }

    /// Baseline of line `i`, in PDF coordinates.
    #[allow(clippy::cast_precision_loss)]
    fn baseline_y(&self, i: usize) -> f32 {
        self.page_height - (self.first_baseline + i as f32 * self.line_pitch)
    }
}

/// Word wrap text so no line is wider than `max_units` glyph units.
///
/// Widths are Helvetica advance widths. Words wider than a line are cut
/// into line-sized pieces; a line always takes at least one character.
pub fn word_wrap(text: &str, max_units: u32) -> Vec<String> {
    let space = char_width(' ');
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_units = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        let mut word_units: u32 = word.iter().copied().map(char_width).sum();

        while word_units > max_units {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let mut cut = 0;
            let mut cut_units = 0;
            for &c in &word {
                let w = char_width(c);
                if cut > 0 && cut_units + w > max_units {
                    break;
                }
                cut += 1;
                cut_units += w;
            }
            let rest = word.split_off(cut);
            lines.push(word.into_iter().collect());
            word = rest;
            word_units -= cut_units;
            current_units = 0;
        }

        if word.is_empty() {
            continue;
        }

        if current_line.is_empty() {
            current_line = word.iter().collect();
            current_units = word_units;
        } else if current_units + space + word_units <= max_units {
            current_line.push(' ');
            current_line.extend(word.iter());
            current_units += space + word_units;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.iter().collect()));
            current_units = word_units;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

// =============================================================================
// Reconstructor
// =============================================================================

/// Composes translated pages over rasterized originals.
pub struct Reconstructor {
    rasterizer: Arc<dyn Rasterize>,
    layout: LayoutConfig,
    progress: ProgressReporter,
}

impl Reconstructor {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_rasterizer(
            Arc::new(PageRasterizer::from_config(&config.render)),
            config.layout,
        )
    }

    /// Create with a custom rasterizer
    pub fn with_rasterizer(rasterizer: Arc<dyn Rasterize>, layout: LayoutConfig) -> Self {
        Self {
            rasterizer,
            layout,
            progress: ProgressReporter::disabled(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Compose one output PDF with a page per record, in page-number order.
    ///
    /// A page whose original cannot be rasterized is emitted as text on a
    /// blank page; nothing else about that page aborts the document.
    pub async fn compose(&self, doc: &PdfDocument, pages: &[TranslatedPageRecord]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(Error::Compose("no pages to compose".to_string()));
        }

        let mut ordered: Vec<&TranslatedPageRecord> = pages.iter().collect();
        ordered.sort_by_key(|p| p.page_number);

        let total = ordered.len();
        let mut builder = OutputBuilder::new(self.layout);

        for (i, record) in ordered.into_iter().enumerate() {
            match self.rasterizer.rasterize(doc, record.page_number) {
                Ok(raster) => builder.add_page(record, Some(&raster))?,
                Err(e) => {
                    warn!(
                        "Rendering page {} failed, emitting text only: {}",
                        record.page_number, e
                    );
                    builder.add_page(record, None)?;
                }
            }

            self.progress.emit(ProgressEvent::CompositionProgress {
                current: i + 1,
                total,
            });
            tokio::task::yield_now().await;
        }

        let bytes = builder.finish()?;
        info!("Composed {} pages ({} bytes)", total, bytes.len());
        Ok(bytes)
    }

    /// Compose only what a checkpoint already holds.
    pub async fn export_partial(&self, doc: &PdfDocument, checkpoint: &Checkpoint) -> Result<Vec<u8>> {
        info!(
            "Exporting {} checkpointed pages of {}",
            checkpoint.pages.len(),
            checkpoint.file_name
        );
        self.compose(doc, &checkpoint.pages).await
    }
}

// =============================================================================
// PDF Assembly
// =============================================================================

/// Accumulates output pages into a single lopdf document.
struct OutputBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    wash_id: ObjectId,
    opaque_id: ObjectId,
    kids: Vec<Object>,
    layout: LayoutConfig,
}

impl OutputBuilder {
    fn new(layout: LayoutConfig) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));

        let graphics_state = |alpha: f32| {
            Dictionary::from_iter([
                ("Type", Object::Name(b"ExtGState".to_vec())),
                ("ca", Object::Real(alpha)),
                ("CA", Object::Real(alpha)),
            ])
        };
        let wash_id = doc.add_object(graphics_state(layout.overlay_alpha));
        let opaque_id = doc.add_object(graphics_state(1.0));

        Self {
            doc,
            pages_id,
            font_id,
            wash_id,
            opaque_id,
            kids: Vec::new(),
            layout,
        }
    }

    fn add_page(&mut self, record: &TranslatedPageRecord, raster: Option<&RasterPage>) -> Result<()> {
        let (width, height) = raster.map_or(FALLBACK_PAGE_SIZE, |r| (r.width_pt, r.height_pt));
        let layout = PageLayout::new(width, height, &self.layout);

        let (lines, dropped) = layout.flow(&record.translated_text);
        if dropped > 0 {
            debug!(
                "Page {}: {} lines did not fit and were dropped",
                record.page_number, dropped
            );
        }

        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        if let Some(raster) = raster {
            let image_id = self.add_image(raster);
            xobjects.set(IMAGE_NAME, Object::Reference(image_id));

            // Full-bleed background
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width),
                        0.into(),
                        0.into(),
                        Object::Real(height),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ]);

            // Whitewash inside the margin
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(WASH_STATE.as_bytes().to_vec())]),
                Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(layout.margin),
                        Object::Real(layout.margin),
                        Object::Real((width - 2.0 * layout.margin).max(0.0)),
                        Object::Real((height - 2.0 * layout.margin).max(0.0)),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
        }

        operations.push(Operation::new("gs", vec![Object::Name(OPAQUE_STATE.as_bytes().to_vec())]));
        operations.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(FONT_NAME.as_bytes().to_vec()), Object::Real(layout.font_size)],
                ),
                Operation::new(
                    "Td",
                    vec![Object::Real(layout.text_x), Object::Real(layout.baseline_y(i))],
                ),
                Operation::new("Tj", vec![Object::String(to_win_ansi(line), StringFormat::Literal)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| Error::Compose(format!("failed to encode page {}: {e}", record.page_number)))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let resources = Dictionary::from_iter([
            (
                "Font",
                Object::Dictionary(Dictionary::from_iter([(FONT_NAME, Object::Reference(self.font_id))])),
            ),
            (
                "ExtGState",
                Object::Dictionary(Dictionary::from_iter([
                    (WASH_STATE, Object::Reference(self.wash_id)),
                    (OPAQUE_STATE, Object::Reference(self.opaque_id)),
                ])),
            ),
            ("XObject", Object::Dictionary(xobjects)),
        ]);

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));

        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Embed a JPEG as-is (DCTDecode).
    fn add_image(&mut self, raster: &RasterPage) -> ObjectId {
        let dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(raster.width_px))),
            ("Height", Object::Integer(i64::from(raster.height_px))),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let stream = Stream::new(dict, raster.jpeg.clone()).with_compression(false);
        self.doc.add_object(Object::Stream(stream))
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        #[allow(clippy::cast_possible_wrap)]
        let count = self.kids.len() as i64;

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(self.kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::Compose(format!("failed to save PDF: {e}")))?;
        Ok(output)
    }
}

// =============================================================================
// Tests
// =============================================================================
