//! Overlapping recursive text splitter.
//!
//! Splits a document's text into [`Passage`]s of at most `chunk_size`
//! characters, with up to `chunk_overlap` characters repeated between
//! consecutive passages so that context crossing a boundary survives.
//!
//! # Algorithm
//!
//! 1. Split on the coarsest separator present (`"\n\n"`, then `"\n"`,
//!    `"."`, `" "`), keeping each separator attached to the piece before it.
//! 2. Pieces still longer than `chunk_size` are split again with the next
//!    separator; with none left they are hard-split on char boundaries.
//! 3. Pieces are merged greedily into a window of at most `chunk_size`
//!    characters. When the window is flushed, pieces are dropped from its
//!    front until at most `chunk_overlap` characters remain.
//!
//! # Example
//!
//! ```rust
//! use econ_analyst_core::chunk::chunk_document;
//!
//! let passages = chunk_document("imf_weo_2024", "Growth slowed.\n\nPrices eased.", 800, 150);
//! assert_eq!(passages.len(), 1);
//! assert_eq!(passages[0].id, "imf_weo_2024_chunk_0");
//! ```

use sha2::{Digest, Sha256};
use std::collections::VecDeque;

use crate::models::Passage;

/// Default maximum passage length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive passages, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

const SEPARATORS: &[&str] = &["\n\n", "\n", ".", " "];

/// Split a document into passages with ids `"{document}_chunk_{i}"`.
///
/// Empty or whitespace-only text yields no passages. Indices are
/// contiguous from 0 and identical input always yields identical output.
pub fn chunk_document(
    document: &str,
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Passage> {
    split_text(text, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(i, t)| make_passage(document, i as i64, &t))
        .collect()
}

/// Split text into overlapping, trimmed chunks.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = chunk_overlap.min(chunk_size - 1);

    let pieces = split_pieces(text, SEPARATORS, chunk_size);
    merge_pieces(&pieces, chunk_size, overlap)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_pieces<'a>(text: &'a str, separators: &[&str], chunk_size: usize) -> Vec<&'a str> {
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= chunk_size {
        return vec![text];
    }

    let Some(pos) = separators.iter().position(|sep| text.contains(*sep)) else {
        return hard_split(text, chunk_size);
    };
    let sep = separators[pos];
    let finer = &separators[pos + 1..];

    let mut out = Vec::new();
    for piece in text.split_inclusive(sep) {
        if char_len(piece) <= chunk_size {
            out.push(piece);
        } else {
            out.extend(split_pieces(piece, finer, chunk_size));
        }
    }
    out
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn merge_pieces(pieces: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut window_len = 0usize;
    // Whether the window holds non-blank text not yet emitted.
    let mut pending = false;

    for &piece in pieces {
        let len = char_len(piece);

        if window_len + len > chunk_size && !window.is_empty() {
            if pending {
                flush(&mut chunks, &window);
                pending = false;
            }
            while window_len > overlap || (window_len > 0 && window_len + len > chunk_size) {
                match window.pop_front() {
                    Some(front) => window_len -= char_len(front),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        window_len += len;
        if !piece.trim().is_empty() {
            pending = true;
        }
    }

    if pending {
        flush(&mut chunks, &window);
    }

    chunks
}

fn flush(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn make_passage(document: &str, index: i64, text: &str) -> Passage {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Passage {
        id: format!("{}_chunk_{}", document, index),
        document: document.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
