mod compose;
mod document;
mod metrics;
mod page_index;
mod render;
mod text;

pub use compose::{PageLayout, Reconstructor, word_wrap};
pub use document::{MAX_INPUT_BYTES, PdfDocument, validate_input};
pub use metrics::{glyph_width, text_width, to_win_ansi};
pub use page_index::PageIndex;
pub use render::{PageRasterizer, RasterPage, Rasterize};
pub use text::{LINE_BREAK_THRESHOLD, TextExtractor, TextFragment, assemble_page_text, normalize_lines};
