use crate::error::StoreError;
use crate::models::{QueryFilter, ScoredRecord, VectorRecord};
use async_trait::async_trait;

/// Outcome of one upsert batch. A record whose vector length does not match
/// the store is rejected on its own; the rest of the batch still lands.
#[derive(Debug, Default)]
pub struct UpsertOutcome {
    pub written: u64,
    pub rejected: Vec<(String, StoreError)>,
}

/// Nearest-neighbor store over (vector, text, metadata) records.
///
/// Every implementation ranks by cosine similarity, and both ingestion and
/// querying must go through the same embedding model. Ties are broken by
/// insertion order, earlier record first.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn dimensions(&self) -> usize;

    /// Insert-or-replace by record id. Once this returns, the records are
    /// visible to queries issued by the same process.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertOutcome, StoreError>;

    /// At most `top_k` records by descending similarity, optionally narrowed
    /// by a metadata filter.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredRecord>, StoreError>;

    /// Removes every record belonging to `document_id`; returns how many.
    async fn delete_document(&self, document_id: &str) -> Result<u64, StoreError>;

    /// Clears the store. Irreversible.
    async fn delete_all(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
