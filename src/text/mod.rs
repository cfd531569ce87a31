//! Text segmentation: fixed-size chunking and sentence splitting

pub mod chunker;
pub mod sentences;

pub use chunker::{chunks, Chunks, DEFAULT_CHUNK_SIZE};
pub use sentences::split_sentences;
