pub mod chunk;
pub mod generator;

pub use chunk::{Chunk, ChunkSection};
pub use generator::{generate_flat_chunk, generate_flat_chunk_at};
