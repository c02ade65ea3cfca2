//! Boundary-aware semantic chunking.
//!
//! A document is split coarsely along a separator hierarchy, undersized
//! fragments are merged forward, and oversized runs are then subdivided at
//! the points of greatest embedding discontinuity until every chunk fits
//! under the length ceiling. All length accounting is in characters.

use std::cmp::Ordering;
use std::sync::Arc;

use bylaw_llm::LlmProvider;

use crate::error::Result;
use crate::types::{Chunk, ChunkMetadata};

/// Separator hierarchy for the coarse split, coarsest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Distances at or below this are floating-point noise, never breakpoints.
const NOISE_FLOOR: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Ceiling for fragments out of the coarse split.
    pub chunk_size: usize,
    /// Fragments below this are merged into their neighbors.
    pub min_fragment_len: usize,
    /// Ceiling for final chunks.
    pub max_chunk_len: usize,
    /// Percentile (0..=1) of adjacent-fragment distances above which a gap
    /// counts as a topic boundary.
    pub breakpoint_percentile: f64,
    /// Documents shorter than this bypass chunking entirely.
    pub min_document_len: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            min_fragment_len: 100,
            max_chunk_len: 1500,
            breakpoint_percentile: 0.85,
            min_document_len: 100,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Coarse split along the separator hierarchy followed by the forward merge
/// of undersized fragments.
///
/// Fragments come back trimmed, non-empty, in document order, and no larger
/// than `chunk_size` characters; merged fragments stay below
/// `min_fragment_len` plus one source fragment.
#[must_use]
pub fn initial_split(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let chunk_size = config.chunk_size.max(1);
    let mut fragments = Vec::new();
    split_by_separators(text, chunk_size, &SEPARATORS, &mut fragments);
    merge_short(fragments, config.min_fragment_len)
}

fn split_by_separators(text: &str, chunk_size: usize, separators: &[&str], out: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= chunk_size {
        flush_fragment(&mut text.to_string(), out);
        return;
    }
    let Some((separator, rest)) = separators.split_first() else {
        out.extend(char_windows(text, chunk_size));
        return;
    };
    if !text.contains(separator) {
        split_by_separators(text, chunk_size, rest, out);
        return;
    }

    // Greedily pack separator-delimited pieces up to chunk_size; a piece
    // that is itself too large descends to the finer separators.
    let mut current = String::new();
    for piece in text.split_inclusive(separator) {
        let piece_len = char_len(piece);
        if piece_len > chunk_size {
            flush_fragment(&mut current, out);
            split_by_separators(piece, chunk_size, rest, out);
        } else if char_len(&current) + piece_len > chunk_size {
            flush_fragment(&mut current, out);
            current.push_str(piece);
        } else {
            current.push_str(piece);
        }
    }
    flush_fragment(&mut current, out);
}

fn flush_fragment(buffer: &mut String, out: &mut Vec<String>) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    buffer.clear();
}

fn char_windows(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        start = end;
    }
    out
}

/// Forward merge: the buffer accumulates fragments while it stays under
/// `min_len`; once adding the next fragment would reach `min_len`, the old
/// buffer is emitted and the buffer restarts from that fragment. The final
/// buffer is emitted even when short.
fn merge_short(fragments: Vec<String>, min_len: usize) -> Vec<String> {
    let mut merged = Vec::new();
    let mut buffer = String::new();
    for fragment in fragments {
        let combined = if buffer.is_empty() {
            fragment.clone()
        } else {
            format!("{buffer} {fragment}")
        };
        if char_len(&combined) < min_len {
            buffer = combined;
        } else {
            if !buffer.is_empty() {
                merged.push(std::mem::take(&mut buffer));
            }
            buffer = fragment;
        }
    }
    if !buffer.is_empty() {
        merged.push(buffer);
    }
    merged
}

/// Indices `i` marking a topic boundary between fragment `i` and `i + 1`.
///
/// The boundary threshold is the given percentile (linear interpolation) of
/// all adjacent-embedding cosine distances, so sensitivity adapts to each
/// document. Fewer than two embeddings yield no breakpoints.
#[must_use]
pub fn find_breakpoints(embeddings: &[Vec<f32>], percentile: f64) -> Vec<usize> {
    if embeddings.len() < 2 {
        return Vec::new();
    }
    let distances: Vec<f32> = embeddings
        .windows(2)
        .map(|pair| cosine_distance(&pair[0], &pair[1]))
        .collect();
    let threshold = percentile_value(&distances, percentile);
    distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d >= threshold && d > NOISE_FLOOR)
        .map(|(i, _)| i)
        .collect()
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn percentile_value(values: &[f32], percentile: f64) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let rank = percentile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    ((1.0 - weight) * f64::from(sorted[lo]) + weight * f64::from(sorted[hi])) as f32
}

fn joined_len(fragments: &[String]) -> usize {
    let chars: usize = fragments.iter().map(|f| char_len(f)).sum();
    chars + fragments.len().saturating_sub(1)
}

/// Subdivide fragment runs at their weakest semantic points until every
/// output chunk is under `max_chunk_len` joined characters.
///
/// Driven by an explicit work list of fragment ranges, so stack depth never
/// tracks input size. A range with no breakpoints splits at its midpoint;
/// otherwise it is cut at every breakpoint and each segment is re-examined.
/// Output chunks are the space-joined fragments of each emitted range, in
/// document order.
///
/// # Panics
///
/// Panics if `embeddings` is shorter than `fragments`; the two must be
/// index-aligned.
#[must_use]
pub fn recursive_chunk(
    fragments: &[String],
    embeddings: &[Vec<f32>],
    config: &ChunkerConfig,
) -> Vec<String> {
    let mut chunks = Vec::new();
    if fragments.is_empty() {
        return chunks;
    }

    // LIFO work list; sub-ranges are pushed in reverse so chunks come out in
    // document order.
    let mut work = vec![(0usize, fragments.len())];
    while let Some((start, end)) = work.pop() {
        let range = &fragments[start..end];
        if range.len() <= 1 || joined_len(range) < config.max_chunk_len {
            chunks.push(range.join(" "));
            continue;
        }

        let breakpoints = find_breakpoints(&embeddings[start..end], config.breakpoint_percentile);
        if breakpoints.is_empty() {
            let mid = start + range.len() / 2;
            work.push((mid, end));
            work.push((start, mid));
            continue;
        }

        // Cut bounds: the breakpoint fragment stays in the left segment.
        let mut bounds = Vec::with_capacity(breakpoints.len() + 2);
        bounds.push(start);
        for bp in breakpoints {
            bounds.push(start + bp + 1);
        }
        bounds.push(end);
        for pair in bounds.windows(2).rev() {
            work.push((pair[0], pair[1]));
        }
    }
    chunks
}

/// Chunks one document at a time, embedding its fragments in a single
/// provider batch and reusing those embeddings across every subdivision.
pub struct SemanticChunker<P> {
    provider: Arc<P>,
    config: ChunkerConfig,
}

impl<P> std::fmt::Debug for SemanticChunker<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticChunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> SemanticChunker<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: ChunkerConfig) -> Self {
        Self { provider, config }
    }

    /// Split `text` into final chunks with sequential `chunk_index`.
    ///
    /// Documents shorter than `min_document_len` after trimming, or yielding
    /// fewer than two initial fragments, bypass chunking and come back as a
    /// single chunk with `chunk_index = 0, cluster_id = 0`.
    ///
    /// # Errors
    ///
    /// Returns an error if fragment embedding fails.
    pub async fn chunk_document(&self, text: &str, source_document: &str) -> Result<Vec<Chunk>> {
        let trimmed = text.trim();
        if char_len(trimmed) < self.config.min_document_len {
            return Ok(vec![single_chunk(trimmed, source_document)]);
        }
        let fragments = initial_split(text, &self.config);
        if fragments.len() < 2 {
            return Ok(vec![single_chunk(trimmed, source_document)]);
        }

        let embeddings = self.provider.embed(&fragments).await?;
        let final_texts = recursive_chunk(&fragments, &embeddings, &self.config);

        Ok(final_texts
            .into_iter()
            .filter_map(|t| {
                let trimmed = t.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                text,
                metadata: ChunkMetadata {
                    source_document: source_document.to_string(),
                    chunk_index,
                    cluster_id: 0,
                    cluster_label: String::new(),
                },
            })
            .collect())
    }
}

fn single_chunk(text: &str, source_document: &str) -> Chunk {
    Chunk {
        text: text.to_string(),
        metadata: ChunkMetadata {
            source_document: source_document.to_string(),
            chunk_index: 0,
            cluster_id: 0,
            cluster_label: String::new(),
        },
    }
}
