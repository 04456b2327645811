
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::embeddings::OllamaClient;
use crate::generation::GeminiClient;
use crate::index::{ChunkHit, ChunkIndex};

/// Number of chunks retrieved per question. The stock retrieval default;
/// deliberately not a configuration knob.
pub const DEFAULT_TOP_K: usize = 4;

const PROMPT_HEADER: &str = "Use the following pieces of context to answer the question at the \
end. If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// The retrieval-augmented answer pipeline.
///
/// Holds its collaborators as read-only dependencies handed in by the caller;
/// it owns no state of its own and each `answer` call is independent.
pub struct AnswerPipeline {
    embedder: Arc<OllamaClient>,
    index: Arc<ChunkIndex>,
    generator: GeminiClient,
}

impl AnswerPipeline {
    #[inline]
    pub fn new(
        embedder: Arc<OllamaClient>,
        index: Arc<ChunkIndex>,
        generator: GeminiClient,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
        }
    }

    /// Answer one question: embed it, retrieve the nearest stored chunks,
    /// stuff them into the prompt template, and return the model's text
    /// response unmodified.
    ///
    /// Every failure propagates to the caller as-is. Nothing is retried, and
    /// an empty retrieval is not an error: the prompt simply carries no
    /// context.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<String> {
        debug!("Answering question (length: {})", question.len());

        let embedding = self
            .embedder
            .generate_embedding(question)
            .map_err(|e| crate::ExplorerError::Embedding(format!("{:#}", e)))?;

        let hits = self.index.search_similar(&embedding, DEFAULT_TOP_K).await?;
        debug!("Retrieved {} context chunks", hits.len());

        let prompt = build_prompt(&hits, question);

        let answer = self
            .generator
            .generate(&prompt)
            .map_err(|e| crate::ExplorerError::Generation(format!("{:#}", e)))?;

        Ok(answer)
    }
}

/// Compose the single stuffed prompt: instructions, all retrieved chunks as
/// one context block, then the question.
#[inline]
pub fn build_prompt(hits: &[ChunkHit], question: &str) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{PROMPT_HEADER}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}
