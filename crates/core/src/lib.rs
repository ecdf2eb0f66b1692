pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod query;
pub mod service;
pub mod stores;
pub mod traits;

pub use chunking::{chunk, Chunks};
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, OpenAiConfig, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL,
};
pub use error::{EmbedError, IngestError, QueryError, StoreError};
pub use extractor::{LopdfExtractor, TextExtractor};
pub use fetch::fetch_pdf;
pub use ingest::{discover_pdf_files, IngestPipeline};
pub use models::{
    Chunk, DocumentFailure, DocumentText, IngestOptions, IngestReport, QueryFilter, QueryHit,
    QueryResult, RecordMetadata, ScoredRecord, VectorRecord,
};
pub use query::QueryEngine;
pub use service::{Service, ServiceError, ToolRequest, ToolResponse};
pub use stores::{MemoryStore, QdrantStore};
pub use traits::{UpsertOutcome, VectorStore};
