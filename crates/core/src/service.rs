use crate::error::{IngestError, QueryError, StoreError};
use crate::ingest::IngestPipeline;
use crate::models::{IngestReport, QueryResult};
use crate::query::QueryEngine;
use crate::traits::VectorStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

fn default_top_k() -> usize {
    5
}

/// The closed set of operations the tool-dispatch layer may invoke. Every
/// accepted operation is enumerable here; there is no open-ended dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ToolRequest {
    IngestFolder {
        path: String,
    },
    Query {
        question: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
    },
    Reset,
    Ping,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolResponse {
    Ingest(IngestReport),
    Query(QueryResult),
    Reset { records_removed: u64 },
    Pong { records: u64 },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the core's moving parts for the process lifetime. The transport layer
/// holds exactly one of these; nothing here is ambient global state.
pub struct Service {
    pipeline: IngestPipeline,
    engine: QueryEngine,
    store: Arc<dyn VectorStore>,
}

impl Service {
    pub fn new(pipeline: IngestPipeline, engine: QueryEngine, store: Arc<dyn VectorStore>) -> Self {
        Self {
            pipeline,
            engine,
            store,
        }
    }

    pub async fn dispatch(&self, request: ToolRequest) -> Result<ToolResponse, ServiceError> {
        match request {
            ToolRequest::IngestFolder { path } => {
                let report = self.pipeline.ingest_folder(Path::new(&path)).await?;
                Ok(ToolResponse::Ingest(report))
            }
            ToolRequest::Query { question, top_k } => {
                let result = self.engine.query(&question, top_k, None).await?;
                Ok(ToolResponse::Query(result))
            }
            ToolRequest::Reset => {
                let records_removed = self.store.count().await?;
                self.store.delete_all().await?;
                info!(records_removed, "store reset");
                Ok(ToolResponse::Reset { records_removed })
            }
            ToolRequest::Ping => Ok(ToolResponse::Pong {
                records: self.store.count().await?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::error::Result;
    use crate::extractor::TextExtractor;
    use crate::models::{document_id_for, DocumentText, IngestOptions};
    use crate::stores::MemoryStore;
    use chrono::Utc;
    use std::fs;
    use tempfile::tempdir;

    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract(&self, path: &Path) -> Result<DocumentText> {
            let content = std::fs::read_to_string(path)?;
            let source_path = path.to_string_lossy().to_string();
            Ok(DocumentText {
                document_id: document_id_for(&source_path),
                source_path,
                text: content,
                page_count: 1,
                extracted_at: Utc::now(),
            })
        }
    }

    fn service_over(store: Arc<MemoryStore>) -> Service {
        let embedder = Arc::new(CharacterNgramEmbedder::default());
        let pipeline = IngestPipeline::new(
            Arc::new(PlainTextExtractor),
            embedder.clone(),
            store.clone(),
            IngestOptions::default(),
        );
        let engine = QueryEngine::new(
            embedder,
            store.clone(),
            IngestOptions::default().max_embed_attempts,
        );
        Service::new(pipeline, engine, store)
    }

    #[test]
    fn requests_parse_from_tagged_json() {
        let ping: ToolRequest = serde_json::from_str(r#"{"op":"ping"}"#).unwrap();
        assert_eq!(ping, ToolRequest::Ping);

        let query: ToolRequest =
            serde_json::from_str(r#"{"op":"query","question":"what is attention?"}"#).unwrap();
        assert_eq!(
            query,
            ToolRequest::Query {
                question: "what is attention?".to_string(),
                top_k: 5,
            }
        );

        assert!(serde_json::from_str::<ToolRequest>(r#"{"op":"drop_tables"}"#).is_err());
    }

    #[tokio::test]
    async fn ingest_then_query_then_reset_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("paper.pdf"),
            "retrieval augmented generation grounds answers in sources ".repeat(20),
        )?;

        let store = Arc::new(MemoryStore::new(128));
        let service = service_over(store.clone());

        let response = service
            .dispatch(ToolRequest::IngestFolder {
                path: dir.path().to_string_lossy().to_string(),
            })
            .await?;
        let written = match response {
            ToolResponse::Ingest(report) => {
                assert!(report.errors.is_empty());
                report.chunks_written
            }
            other => panic!("unexpected response: {other:?}"),
        };
        assert!(written > 0);

        let response = service
            .dispatch(ToolRequest::Query {
                question: "what grounds answers?".to_string(),
                top_k: 3,
            })
            .await?;
        match response {
            ToolResponse::Query(result) => assert!(!result.hits.is_empty()),
            other => panic!("unexpected response: {other:?}"),
        }

        let response = service.dispatch(ToolRequest::Reset).await?;
        match response {
            ToolResponse::Reset { records_removed } => assert_eq!(records_removed, written),
            other => panic!("unexpected response: {other:?}"),
        }

        match service.dispatch(ToolRequest::Ping).await? {
            ToolResponse::Pong { records } => assert_eq!(records, 0),
            other => panic!("unexpected response: {other:?}"),
        }
        Ok(())
    }
}
