use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Extracted text of one source document. Exists only between extraction and
/// upsert; a document whose parse fails is never materialized.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub document_id: String,
    pub source_path: String,
    pub text: String,
    pub page_count: usize,
    pub extracted_at: DateTime<Utc>,
}

/// One window produced by the chunker. Offsets are char positions into the
/// source text, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u64,
    pub start_char: usize,
    pub end_char: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub document_id: String,
    pub source_path: String,
    pub chunk_index: u64,
}

/// Persisted (vector, text, metadata) tuple. Owned by the store; the pipeline
/// only writes these through the store API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub document_id: Option<String>,
    pub source_path: Option<String>,
}

impl QueryFilter {
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        self.document_id
            .as_deref()
            .map_or(true, |id| id == metadata.document_id)
            && self
                .source_path
                .as_deref()
                .map_or(true, |path| path == metadata.source_path)
    }

    pub fn is_empty(&self) -> bool {
        self.document_id.is_none() && self.source_path.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub text: String,
    pub document_id: String,
    pub source_path: String,
    pub chunk_index: u64,
    pub score: f32,
}

/// Ranked passages for one question; produced per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub hits: Vec<QueryHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub source_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub chunks_written: u64,
    pub chunks_skipped: u64,
    pub errors: Vec<DocumentFailure>,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_embed_attempts: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
            max_embed_attempts: 4,
        }
    }
}

pub fn document_id_for(source_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic record id from (document identity, chunk index), so
/// re-ingesting an unchanged document lands on the same ids. Shaped as a UUID
/// because qdrant accepts only integer or UUID point ids.
pub fn record_id_for(document_id: &str, chunk_index: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(chunk_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}
