//! Conversion from 1-based page numbers to MuPDF's 0-based `i32` indices.
//!
//! Every public API in this crate speaks 1-based page numbers (the numbers a
//! reader sees); MuPDF wants a 0-based `i32`. The conversion and the range
//! check live here so callers never do the arithmetic by hand.

use std::fmt;

use crate::error::Error;

/// A validated, 0-based page index usable with mupdf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(i32);

impl PageIndex {
    /// Validate a 1-based page number against the document's page count.
    pub fn from_page_number(page_number: usize, total_pages: usize) -> Result<Self, Error> {
        let out_of_range = || Error::InvalidPage {
            page: page_number,
            total: total_pages,
        };

        if page_number == 0 || page_number > total_pages {
            return Err(out_of_range());
        }

        let index = i32::try_from(page_number - 1).map_err(|_| out_of_range())?;
        Ok(Self(index))
    }

    /// Get the underlying 0-based index.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// The 1-based page number this index was built from.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // never negative once constructed
    pub const fn page_number(self) -> usize {
        self.0 as usize + 1
    }
}

impl From<PageIndex> for i32 {
    fn from(index: PageIndex) -> Self {
        index.0
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.page_number())
    }
}
