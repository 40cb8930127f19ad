//! Reading-order text extraction.
//!
//! MuPDF hands us structured-text lines in content-stream order. Each line is
//! treated as one fragment with a vertical baseline; consecutive fragments
//! whose baselines differ by more than [`LINE_BREAK_THRESHOLD`] start a new
//! output line, everything else is joined with a single space. This is a
//! single-column approximation, not a layout model.

use mupdf::TextPageOptions;
use tracing::debug;

use super::document::PdfDocument;
use super::page_index::PageIndex;
use crate::error::{Error, Result};
use crate::page::PageRecord;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Baseline shift (in layout units) that starts a new line.
pub const LINE_BREAK_THRESHOLD: f32 = 10.0;

/// A run of text sitting on one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    /// Vertical position of the run's baseline
    pub baseline: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, baseline: f32) -> Self {
        Self {
            text: text.into(),
            baseline,
        }
    }
}

/// Join fragments into newline-separated lines, then normalize them.
pub fn assemble_page_text<I>(fragments: I, threshold: f32) -> String
where
    I: IntoIterator<Item = TextFragment>,
{
    let mut raw = String::new();
    let mut last_baseline: Option<f32> = None;

    for fragment in fragments {
        match last_baseline {
            Some(last) if (fragment.baseline - last).abs() > threshold => raw.push('\n'),
            _ if !raw.is_empty() && !raw.ends_with('\n') => raw.push(' '),
            _ => {}
        }

        raw.push_str(&fragment.text);
        last_baseline = Some(fragment.baseline);
    }

    normalize_lines(&raw)
}

/// Trim every line, collapse whitespace runs, drop empty lines.
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text extraction from PDF pages
pub struct TextExtractor<'a> {
    /// The PDF document to extract text from
    pub doc: &'a PdfDocument,
    /// Baseline shift that starts a new line
    pub line_threshold: f32,
}

impl<'a> TextExtractor<'a> {
    /// Create a new text extractor with the default line threshold
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            line_threshold: LINE_BREAK_THRESHOLD,
        }
    }

    /// Collect the page's fragments in parser order.
    pub fn page_fragments(&self, page_number: usize) -> Result<Vec<TextFragment>> {
        let page_index = PageIndex::from_page_number(page_number, self.doc.page_count())?;
        let page_error = |reason: String| Error::Extraction {
            page: Some(page_number),
            reason,
        };

        let doc = self.doc.open_document()?;
        let page = doc
            .load_page(page_index.into())
            .map_err(|e| page_error(format!("failed to load page: {e}")))?;

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| page_error(format!("failed to get text page: {e}")))?;

        let mut fragments = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let mut text = String::new();
                let mut baseline = None;

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        text.push(c);
                        // Lower edge of the first glyph (top-left origin)
                        baseline.get_or_insert_with(|| {
                            let quad = text_char.quad();
                            quad.ll.y.max(quad.lr.y)
                        });
                    }
                }

                if let Some(baseline) = baseline {
                    fragments.push(TextFragment { text, baseline });
                }
            }
        }

        Ok(fragments)
    }

    /// Extract one page as a reading-order record.
    pub fn extract_page(&self, page_number: usize) -> Result<PageRecord> {
        let fragments = self.page_fragments(page_number)?;
        let fragment_count = fragments.len();
        let text = assemble_page_text(fragments, self.line_threshold);

        debug!(
            "Extracted page {} ({} fragments, {} lines)",
            page_number,
            fragment_count,
            text.lines().count()
        );

        Ok(PageRecord::new(page_number, text))
    }

    /// Lazily extract every page, in order.
    pub fn pages(&self) -> impl Iterator<Item = Result<PageRecord>> + '_ {
        (1..=self.doc.page_count()).map(|page_number| self.extract_page(page_number))
    }

    /// Extract every page, reporting `(current, total)` after each one.
    ///
    /// Yields to the runtime between pages so progress consumers get a turn.
    pub async fn extract_all(&self, progress: &ProgressReporter) -> Result<Vec<PageRecord>> {
        let total = self.doc.page_count();
        let mut records = Vec::with_capacity(total);

        for (i, record) in self.pages().enumerate() {
            records.push(record?);
            progress.emit(ProgressEvent::ExtractionProgress {
                current: i + 1,
                total,
            });
            tokio::task::yield_now().await;
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, baseline: f32) -> TextFragment {
        TextFragment::new(text, baseline)
    }

    #[test]
    fn test_same_baseline_joins_with_single_space() {
        let text = assemble_page_text(
            vec![frag("Hello", 100.0), frag("brave", 100.0), frag("world", 100.0)],
            LINE_BREAK_THRESHOLD,
        );
        assert_eq!(text, "Hello brave world");
    }

    #[test]
    fn test_shift_within_threshold_stays_on_line() {
        let text = assemble_page_text(
            vec![frag("x", 100.0), frag("squared", 95.0), frag("end", 104.9)],
            LINE_BREAK_THRESHOLD,
        );
        assert_eq!(text, "x squared end");
    }

    #[test]
    fn test_shift_beyond_threshold_starts_new_line() {
        let text = assemble_page_text(
            vec![frag("Title", 50.0), frag("Body line", 70.0), frag("next", 80.5)],
            LINE_BREAK_THRESHOLD,
        );
        assert_eq!(text, "Title\nBody line\nnext");
    }

    #[test]
    fn test_shift_is_direction_independent() {
        let text = assemble_page_text(
            vec![frag("lower", 700.0), frag("upper", 680.0)],
            LINE_BREAK_THRESHOLD,
        );
        assert_eq!(text, "lower\nupper");
    }

    #[test]
    fn test_exactly_threshold_is_same_line() {
        let text = assemble_page_text(vec![frag("a", 0.0), frag("b", 10.0)], LINE_BREAK_THRESHOLD);
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let text = assemble_page_text(
            vec![
                frag("  spaced   out  ", 10.0),
                frag("   ", 40.0),
                frag("tab\there", 80.0),
            ],
            LINE_BREAK_THRESHOLD,
        );
        assert_eq!(text, "spaced out\ntab here");
    }

    #[test]
    fn test_no_fragments_is_empty() {
        assert_eq!(assemble_page_text(Vec::new(), LINE_BREAK_THRESHOLD), "");
    }

    #[test]
    fn test_normalize_drops_blank_lines() {
        assert_eq!(normalize_lines("a\n\n  \n b  c \n"), "a\nb c");
    }
}
