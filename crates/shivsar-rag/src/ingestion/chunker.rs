//! Text splitting into overlapping chunks with page and position tracking
//!
//! All sizes are measured in characters (Unicode scalar values), never bytes.

use std::collections::VecDeque;

use crate::config::{ChunkingConfig, ChunkingStrategy};
use crate::types::{Chunk, ChunkSource, PageDocument};

/// Separators tried in order by the recursive strategy
const RECURSIVE_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Text splitter with configurable size, overlap and strategy
#[derive(Debug, Clone)]
pub struct TextSplitter {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between neighbouring chunks
    overlap: usize,
    strategy: ChunkingStrategy,
}

impl TextSplitter {
    /// Create a new splitter; overlap is clamped below the chunk size
    pub fn new(chunk_size: usize, overlap: usize, strategy: ChunkingStrategy) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            strategy,
        }
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.strategy)
    }

    /// Split every page, preserving page order
    pub fn split_documents(&self, pages: &[PageDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            let page_chunks = self.split_text(&page.content);
            tracing::debug!("Page {} produced {} chunks", page.page, page_chunks.len());

            for (index, (char_start, content)) in page_chunks.into_iter().enumerate() {
                chunks.push(Chunk::new(
                    content,
                    ChunkSource {
                        source: page.source.clone(),
                        page: page.page,
                        chunk_index: index as u32,
                        char_start,
                    },
                ));
            }
        }
        chunks
    }

    /// Split a single text into `(char_offset, chunk)` pairs
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        match self.strategy {
            ChunkingStrategy::FixedWindow => self.split_fixed(text),
            ChunkingStrategy::Recursive => {
                let pieces = self.split_recursive(text, &RECURSIVE_SEPARATORS);
                locate_chunks(text, pieces)
            }
        }
    }

    /// Fixed windows of `chunk_size` advancing by `chunk_size - overlap`
    fn split_fixed(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                chunks.push((start, window));
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Split on the coarsest separator present, recursing into oversized pieces
    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];

        for (i, candidate) in separators.iter().copied().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in split_keep_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge_splits(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_splits(&fitting));
        }

        chunks
    }

    /// Greedily merge small pieces, carrying up to `overlap` chars forward
    fn merge_splits(&self, pieces: &[String]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_joined(&current, &mut merged);

                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_joined(&current, &mut merged);
        merged
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(current: &VecDeque<&str>, out: &mut Vec<String>) {
    let joined: String = current.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Split keeping each separator attached to the start of the following piece
fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0usize;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push(text[last..idx].to_string());
        }
        last = idx;
    }
    if last < text.len() {
        pieces.push(text[last..].to_string());
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Recover each chunk's character offset in the page text
fn locate_chunks(text: &str, chunks: Vec<String>) -> Vec<(usize, String)> {
    let mut located = Vec::with_capacity(chunks.len());
    let mut cursor = 0usize;

    for chunk in chunks {
        let char_start = match text[cursor..].find(chunk.as_str()) {
            Some(rel) => {
                let byte_start = cursor + rel;
                cursor = byte_start
                    + text[byte_start..].chars().next().map_or(0, char::len_utf8);
                text[..byte_start].chars().count()
            }
            None => text[..cursor].chars().count(),
        };
        located.push((char_start, chunk));
    }

    located
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str, page: u32) -> PageDocument {
        PageDocument::new(content, "shivsar_export.pdf", page, "hash")
    }

    #[test]
    fn test_fixed_windows_overlap() {
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let splitter = TextSplitter::new(1000, 200, ChunkingStrategy::FixedWindow);

        let chunks = splitter.split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].0, 0);
        assert_eq!(chunks[1].0, 800);
        assert_eq!(chunks[2].0, 1600);
        assert_eq!(char_len(&chunks[0].1), 1000);
        assert_eq!(char_len(&chunks[2].1), 900);
        assert_eq!(&chunks[0].1[800..], &chunks[1].1[..200]);
    }

    #[test]
    fn test_fixed_window_boundaries() {
        let splitter = TextSplitter::new(1000, 200, ChunkingStrategy::FixedWindow);

        assert_eq!(splitter.split_text(&"x".repeat(1000)).len(), 1);

        let chunks = splitter.split_text(&"x".repeat(1001));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].0, 800);
        assert_eq!(char_len(&chunks[1].1), 201);

        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("  \n\t ").is_empty());
    }

    #[test]
    fn test_fixed_window_counts_chars_not_bytes() {
        let splitter = TextSplitter::new(1000, 200, ChunkingStrategy::FixedWindow);
        let chunks = splitter.split_text(&"é".repeat(1500));

        assert_eq!(chunks.len(), 2);
        assert_eq!(char_len(&chunks[0].1), 1000);
        assert_eq!(char_len(&chunks[1].1), 700);
    }

    #[test]
    fn test_recursive_prefers_word_boundaries() {
        let splitter = TextSplitter::new(10, 0, ChunkingStrategy::Recursive);
        let chunks: Vec<String> = splitter
            .split_text("aaaa bbbb cccc")
            .into_iter()
            .map(|(_, c)| c)
            .collect();

        assert_eq!(chunks, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_recursive_carries_overlap() {
        let splitter = TextSplitter::new(10, 5, ChunkingStrategy::Recursive);
        let chunks = splitter.split_text("aaaa bbbb cccc");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], (0, "aaaa bbbb".to_string()));
        assert_eq!(chunks[1], (5, "bbbb cccc".to_string()));
    }

    #[test]
    fn test_recursive_falls_back_to_characters() {
        let splitter = TextSplitter::new(10, 0, ChunkingStrategy::Recursive);
        let chunks: Vec<String> = splitter
            .split_text("abcdefghijklmnop")
            .into_iter()
            .map(|(_, c)| c)
            .collect();

        assert_eq!(chunks, vec!["abcdefghij", "klmnop"]);
    }

    #[test]
    fn test_recursive_keeps_paragraphs_together() {
        let splitter = TextSplitter::new(1000, 200, ChunkingStrategy::Recursive);
        let chunks = splitter.split_text("Red onions.\n\nWhite onions.");

        assert_eq!(chunks, vec![(0, "Red onions.\n\nWhite onions.".to_string())]);
    }

    #[test]
    fn test_split_documents_tracks_pages() {
        let splitter = TextSplitter::new(1000, 200, ChunkingStrategy::FixedWindow);
        let pages = vec![page(&"a".repeat(1500), 0), page("", 1), page("Contact us", 2)];

        let chunks = splitter.split_documents(&pages);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source.page, 0);
        assert_eq!(chunks[1].source.chunk_index, 1);
        assert_eq!(chunks[1].source.char_start, 800);
        assert_eq!(chunks[2].source.page, 2);
        assert_eq!(chunks[2].source.chunk_index, 0);
        assert_eq!(chunks[2].content, "Contact us");
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let splitter = TextSplitter::new(4, 10, ChunkingStrategy::FixedWindow);
        let chunks = splitter.split_text("abcdef");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], (2, "cdef".to_string()));
    }
}
