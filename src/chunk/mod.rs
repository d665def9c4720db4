//! Text chunking
//!
//! Splits extracted document text into the bounded segments that get
//! embedded and indexed. Two strategies: fixed-size windows with overlap
//! (the baseline, reliable on any input), and paragraph splitting for
//! documents with usable structure. Both are pure functions of their input.

use crate::error::{NotedexError, Result};
use serde::{Deserialize, Serialize};

/// Chunking strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Windows of at most `chunk_size` characters, each starting `overlap`
    /// characters before the previous window's end
    FixedWindow,
    /// Split on blank lines, dropping fragments at or below `min_paragraph_len`
    Paragraph,
}

/// Chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub strategy: ChunkStrategy,
    /// Target window length in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive windows
    pub overlap: usize,
    /// Paragraph strategy only: fragments this long or shorter are discarded
    pub min_paragraph_len: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::FixedWindow,
            chunk_size: 1000,
            overlap: 200,
            min_paragraph_len: 50,
        }
    }
}

impl ChunkConfig {
    /// Reject configurations that cannot terminate or produce empty windows
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(NotedexError::InvalidArgument(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(NotedexError::InvalidArgument(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into chunks according to `config`.
///
/// Empty or whitespace-only text yields no chunks. Under the fixed-window
/// strategy, text at most `chunk_size` characters long yields a single
/// chunk equal to the trimmed text.
pub fn chunk(text: &str, config: &ChunkConfig) -> Result<Vec<String>> {
    config.validate()?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    Ok(match config.strategy {
        ChunkStrategy::FixedWindow => {
            fixed_window(trimmed, config.chunk_size, config.overlap)
        }
        ChunkStrategy::Paragraph => paragraphs(trimmed, config.min_paragraph_len),
    })
}

/// Overlapping windows over the character sequence.
///
/// Operates on characters, not bytes, so multi-byte text never splits
/// inside a code point.
fn fixed_window(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Blank-line separated paragraphs, trimmed, short fragments discarded
fn paragraphs(text: &str, min_len: usize) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > min_len)
        .map(str::to_string)
        .collect()
}
