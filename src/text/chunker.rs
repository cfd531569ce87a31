//! Fixed-size character chunker
//!
//! Matched paragraphs are usually longer than the classifier accepts in one
//! call, so they are cut into contiguous chunks of at most `size` characters
//! and scored chunk by chunk. Boundaries are character counts, never byte
//! offsets, so multi-byte text is split between codepoints. Chunks may split
//! words; boundary context is intentionally not carried between chunks.

/// Chunk size used when no override is configured
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Split `text` into contiguous chunks of at most `size` characters
///
/// The iterator is lazy and borrows the input; cloning it restarts the walk
/// from the clone's position. Every chunk except possibly the last has
/// exactly `size` characters, chunks never overlap, and concatenating them
/// reproduces the input. Empty input yields no chunks.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn chunks(text: &str, size: usize) -> Chunks<'_> {
    assert!(size > 0, "chunk size must be positive");
    Chunks { rest: text, size }
}

/// Iterator over fixed-size character chunks of a borrowed string
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        // byte offset of the char after the first `size` chars, or the end
        let split = self
            .rest
            .char_indices()
            .nth(self.size)
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(split);
        self.rest = rest;
        Some(chunk)
    }
}
