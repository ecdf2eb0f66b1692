use crate::embeddings::Embedder;
use crate::error::{EmbedError, QueryError};
use crate::ingest::embed_with_backoff;
use crate::models::{QueryFilter, QueryHit, QueryResult};
use crate::traits::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Answers a natural-language question with the store's top-k passages,
/// verbatim in the store's similarity order.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    max_embed_attempts: usize,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        max_embed_attempts: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            max_embed_attempts,
        }
    }

    pub async fn query(
        &self,
        question: &str,
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<QueryResult, QueryError> {
        if top_k == 0 {
            return Err(QueryError::Config("top_k must be positive".to_string()));
        }
        if question.trim().is_empty() {
            return Err(QueryError::Config("question is empty".to_string()));
        }

        let texts = [question.to_string()];
        let mut vectors =
            embed_with_backoff(self.embedder.as_ref(), &texts, self.max_embed_attempts).await?;
        let question_vector = vectors.pop().ok_or_else(|| {
            QueryError::Embed(EmbedError::Provider(
                "provider returned no vector for the question".to_string(),
            ))
        })?;

        let hits = self.store.query(&question_vector, top_k, filter).await?;
        debug!(question, top_k, hits = hits.len(), "memory queried");

        Ok(QueryResult {
            question: question.to_string(),
            hits: hits
                .into_iter()
                .map(|scored| QueryHit {
                    text: scored.record.text,
                    document_id: scored.record.metadata.document_id,
                    source_path: scored.record.metadata.source_path,
                    chunk_index: scored.record.metadata.chunk_index,
                    score: scored.score,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::error::IngestError;
    use crate::extractor::TextExtractor;
    use crate::ingest::IngestPipeline;
    use crate::models::{document_id_for, DocumentText, IngestOptions};
    use crate::stores::MemoryStore;
    use chrono::Utc;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract(&self, path: &Path) -> Result<DocumentText, IngestError> {
            let content = std::fs::read_to_string(path)?;
            let source_path = path.to_string_lossy().to_string();
            Ok(DocumentText {
                document_id: document_id_for(&source_path),
                source_path,
                text: content,
                page_count: 2,
                extracted_at: Utc::now(),
            })
        }
    }

    fn engine_over(store: Arc<MemoryStore>) -> QueryEngine {
        QueryEngine::new(
            Arc::new(CharacterNgramEmbedder::default()),
            store,
            IngestOptions::default().max_embed_attempts,
        )
    }

    #[tokio::test]
    async fn zero_top_k_is_a_config_error() {
        let engine = engine_over(Arc::new(MemoryStore::new(128)));
        let result = engine.query("what is attention?", 0, None).await;
        assert!(matches!(result, Err(QueryError::Config(_))));
    }

    #[tokio::test]
    async fn blank_question_is_a_config_error() {
        let engine = engine_over(Arc::new(MemoryStore::new(128)));
        let result = engine.query("   ", 5, None).await;
        assert!(matches!(result, Err(QueryError::Config(_))));
    }

    #[tokio::test]
    async fn empty_store_returns_empty_hits() {
        let engine = engine_over(Arc::new(MemoryStore::new(128)));
        let result = engine.query("what is attention?", 5, None).await.unwrap();
        assert!(result.hits.is_empty());
    }

    #[tokio::test]
    async fn nearest_chunk_ranks_first_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
        // 1200 chars in three distinct 400-char regions; with size=500 and
        // overlap=50 the windows are [0,500), [450,950), [900,1200)
        let text = format!(
            "{}{}{}",
            "alpha entropy gradients converge slowly here ".repeat(9)[..400].to_string(),
            "beta attention heads weigh token affinity now ".repeat(9)[..400].to_string(),
            "gamma retrieval augments generation pipelines ".repeat(9)[..400].to_string(),
        );
        assert_eq!(text.chars().count(), 1200);

        let dir = tempdir()?;
        let path = dir.path().join("paper.pdf");
        fs::write(&path, &text)?;

        let embedder = Arc::new(CharacterNgramEmbedder::default());
        let store = Arc::new(MemoryStore::new(embedder.dimensions));
        let pipeline = IngestPipeline::new(
            Arc::new(PlainTextExtractor),
            embedder.clone(),
            store.clone(),
            IngestOptions {
                chunk_size: 500,
                chunk_overlap: 50,
                ..IngestOptions::default()
            },
        );

        let report = pipeline.ingest_folder(dir.path()).await?;
        assert_eq!(report.chunks_written, 3);

        // ask with the exact text of the middle window: its embedding is that
        // chunk's own vector, so chunk 1 must rank first
        let middle: String = text.chars().skip(450).take(500).collect();
        let engine = QueryEngine::new(embedder, store, 1);
        let result = engine.query(&middle, 3, None).await?;

        assert_eq!(result.hits.len(), 3);
        assert_eq!(result.hits[0].chunk_index, 1);
        assert!((result.hits[0].score - 1.0).abs() < 1e-4);
        assert!(result.hits[0].score >= result.hits[1].score);
        assert!(result.hits[1].score >= result.hits[2].score);
        Ok(())
    }
}
