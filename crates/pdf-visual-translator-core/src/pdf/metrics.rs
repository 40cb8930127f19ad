//! Helvetica metrics and WinAnsi encoding for the overlay text.
//!
//! Overlay text is set in the standard Helvetica font, which every viewer
//! ships, so nothing is embedded. Widths come from the Adobe Helvetica AFM
//! and are in glyph units (1/1000 of the font size).

/// Advance widths of WinAnsi codes 0x20..=0xFF. Unassigned codes are 0.
const HELVETICA_WIDTHS: [u16; 224] = [
    // 0x20
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0x30
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 0x40
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // 0x50
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 0x60
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // 0x70
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    // 0x80
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    // 0x90
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    // 0xA0
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // 0xB0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // 0xC0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // 0xD0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // 0xE0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    // 0xF0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Width used for codes below 0x20, which the encoder never produces.
const FALLBACK_WIDTH: u16 = 278;

/// WinAnsi byte for `c`; characters WinAnsi cannot represent become `?`.
pub fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' | '\u{A0}'..='\u{FF}' => u8::try_from(u32::from(c)).unwrap_or(b'?'),
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}

/// Encode text for a simple font with WinAnsiEncoding.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

/// Advance width of one WinAnsi byte, in glyph units.
pub fn glyph_width(byte: u8) -> u16 {
    byte.checked_sub(0x20)
        .map_or(FALLBACK_WIDTH, |i| HELVETICA_WIDTHS[usize::from(i)])
}

/// Advance width of `c` as it will be drawn, in glyph units.
pub fn char_width(c: char) -> u32 {
    u32::from(glyph_width(win_ansi_byte(c)))
}

/// Advance width of `text`, in glyph units.
pub fn text_width(text: &str) -> u32 {
    text.chars().map(char_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(to_win_ansi("Olá"), vec![b'O', b'l', 0xE1]);
        assert_eq!(to_win_ansi("“ok” – €"), vec![0x93, b'o', b'k', 0x94, b' ', 0x96, b' ', 0x80]);
        assert_eq!(to_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_afm_widths() {
        assert_eq!(glyph_width(b' '), 278);
        assert_eq!(glyph_width(b'W'), 944);
        assert_eq!(glyph_width(b'i'), 222);
        assert_eq!(glyph_width(b'0'), 556);
        assert_eq!(glyph_width(b'~'), 584);
        assert_eq!(glyph_width(0x97), 1000);
        assert_eq!(glyph_width(0xFF), 500);
    }

    #[test]
    fn test_accented_letters_match_base_letters() {
        assert_eq!(char_width('á'), char_width('a'));
        assert_eq!(char_width('Ç'), char_width('C'));
        assert_eq!(char_width('í'), 278);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("WWW"), 3 * 944);
        assert_eq!(text_width("iii"), 3 * 222);
        // Unencodable characters are drawn as '?'
        assert_eq!(text_width("日"), 556);
    }
}
