// Chunk index module
// Read-only similarity search over the prebuilt LanceDB dataset

pub mod store;

pub use store::ChunkIndex;

/// A stored text chunk returned by similarity search
#[derive(Debug, Clone)]
pub struct ChunkHit {
    /// The indexed passage text
    pub content: String,
    /// Origin label recorded when the index was built
    pub source: Option<String>,
    /// Raw vector distance reported by the index
    pub distance: f32,
    /// Similarity score derived from the distance (higher is better)
    pub similarity: f32,
}
