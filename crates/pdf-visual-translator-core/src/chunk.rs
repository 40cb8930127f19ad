//! Splitting page text for backends with a request size limit.
//!
//! Sizes are counted in `char`s. Text is first packed paragraph by paragraph
//! (a paragraph being one line of extracted text); a paragraph that alone
//! exceeds the limit is cut at the last sentence terminator that fits, else at
//! the last space, else at the limit itself.

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned as a single chunk, untouched.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.split('\n') {
        let paragraph_len = paragraph.chars().count();

        if paragraph_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(split_paragraph(paragraph, max_chars));
            continue;
        }

        if current.is_empty() {
            current.push_str(paragraph);
            current_len = paragraph_len;
        } else if current_len + 1 + paragraph_len <= max_chars {
            current.push('\n');
            current.push_str(paragraph);
            current_len += 1 + paragraph_len;
        } else {
            chunks.push(std::mem::replace(&mut current, paragraph.to_string()));
            current_len = paragraph_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

/// Hard-split one oversized paragraph.
fn split_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest: Vec<char> = paragraph.chars().collect();

    while rest.len() > max_chars {
        let window = &rest[..max_chars];

        // Index 0 is never a split point, so every iteration consumes input
        let cut = window
            .iter()
            .rposition(|c| SENTENCE_TERMINATORS.contains(c))
            .filter(|&i| i > 0)
            .map(|i| i + 1)
            .or_else(|| window.iter().rposition(|&c| c == ' ').filter(|&i| i > 0))
            .unwrap_or(max_chars);

        let head: String = rest[..cut].iter().collect();
        let head = head.trim();
        if !head.is_empty() {
            pieces.push(head.to_string());
        }

        let skip = rest[cut..].iter().take_while(|c| c.is_whitespace()).count();
        rest.drain(..cut + skip);
    }

    let tail: String = rest.into_iter().collect();
    if !tail.trim().is_empty() {
        pieces.push(tail.trim().to_string());
    }

    pieces
}

/// Rejoin translated chunks of one page.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
