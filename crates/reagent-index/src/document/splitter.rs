use std::ops::Range;

use super::types::{Chunk, Document};

/// Chunking parameters. Sizes are in bytes for sentence packing and in characters
/// for fixed windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub sentence_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            sentence_aware: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// Split a document into ordered chunks. Whitespace-only documents yield nothing.
    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = document.content.as_str();
        if text.trim().is_empty() {
            return Vec::new();
        }

        let SplitterConfig {
            chunk_size,
            chunk_overlap,
            sentence_aware,
        } = self.config;

        let windows: Vec<&str> = if sentence_aware {
            pack_spans(&sentence_spans(text), chunk_size, chunk_overlap)
                .into_iter()
                .map(|range| text[range].trim())
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            char_windows(text, chunk_size, chunk_overlap)
        };

        windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                content: content.to_owned(),
                metadata: document.metadata.clone(),
                chunk_index,
            })
            .collect()
    }
}

/// Byte ranges of sentences. A sentence ends at `.`, `?` or `!` followed by whitespace,
/// or at a blank line; the whitespace after the break belongs to the sentence before it.
fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        let is_break = match c {
            '.' | '?' | '!' => chars.peek().is_some_and(|&(_, next)| next.is_whitespace()),
            '\n' => chars.peek().is_some_and(|&(_, next)| next == '\n'),
            _ => false,
        };
        if !is_break {
            continue;
        }

        let mut end = at + c.len_utf8();
        while let Some(&(ws_at, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            end = ws_at + ws.len_utf8();
            chars.next();
        }
        spans.push(start..end);
        start = end;
    }

    if start < text.len() {
        spans.push(start..text.len());
    }
    spans
}

/// Merge consecutive spans into windows of at most `chunk_size` bytes. Each following
/// window restarts at the earliest sentence that lies within `chunk_overlap` bytes of
/// the previous window's end, as long as the window still reaches a new sentence.
/// A sentence longer than `chunk_size` is a window of its own.
fn pack_spans(
    spans: &[Range<usize>],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    let mut first = 0;

    while first < spans.len() {
        let start = spans[first].start;
        let mut last = first;
        while last + 1 < spans.len() && spans[last + 1].end - start <= chunk_size {
            last += 1;
        }
        let end = spans[last].end;
        windows.push(start..end);

        let Some(next_new) = spans.get(last + 1) else {
            break;
        };
        first = (first + 1..=last)
            .find(|&i| {
                end - spans[i].start <= chunk_overlap && next_new.end - spans[i].start <= chunk_size
            })
            .unwrap_or(last + 1);
    }

    windows
}

/// Fixed windows of `chunk_size` characters advancing by `chunk_size - overlap`.
fn char_windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(at, _)| at)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let size = chunk_size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    (0..char_count)
        .step_by(step)
        .map(|from| &text[bounds[from]..bounds[(from + size).min(char_count)]])
        .collect()
}
