use crate::error::StoreError;
use crate::models::{QueryFilter, ScoredRecord, VectorRecord};
use crate::traits::{UpsertOutcome, VectorStore};
use async_trait::async_trait;
use std::sync::RwLock;

/// Insertion-ordered in-process store. Backs tests and offline runs; the
/// lock serializes physical writes while distinct-id writers stay logically
/// contention-free.
pub struct MemoryStore {
    dimensions: usize,
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(Vec::new()),
        }
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let dot: f32 = left.iter().zip(right.iter()).map(|(a, b)| a * b).sum();
    let norm_left: f32 = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let norm_right: f32 = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if norm_left == 0.0 || norm_right == 0.0 {
        return 0.0;
    }

    dot / (norm_left * norm_right)
}

fn poisoned() -> StoreError {
    StoreError::Backend {
        backend: "memory".to_string(),
        details: "poisoned lock".to_string(),
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome::default();
        let mut guard = self.records.write().map_err(|_| poisoned())?;

        for record in records {
            if record.embedding.len() != self.dimensions {
                let error = StoreError::Dimension {
                    id: record.id.clone(),
                    expected: self.dimensions,
                    actual: record.embedding.len(),
                };
                outcome.rejected.push((record.id, error));
                continue;
            }

            // replacing in place keeps the original insertion slot, which is
            // what makes tie-breaking deterministic across re-upserts
            match guard.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => guard.push(record),
            }
            outcome.written += 1;
        }

        Ok(outcome)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        if vector.len() != self.dimensions {
            return Err(StoreError::Dimension {
                id: "query".to_string(),
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let guard = self.records.read().map_err(|_| poisoned())?;
        let mut hits: Vec<ScoredRecord> = guard
            .iter()
            .filter(|record| filter.map_or(true, |wanted| wanted.matches(&record.metadata)))
            .map(|record| ScoredRecord {
                record: record.clone(),
                score: cosine_similarity(vector, &record.embedding),
            })
            .collect();

        // stable sort: equal scores keep insertion order, earlier wins
        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_document(&self, document_id: &str) -> Result<u64, StoreError> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        let before = guard.len();
        guard.retain(|record| record.metadata.document_id != document_id);
        Ok((before - guard.len()) as u64)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.records.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().map_err(|_| poisoned())?.len() as u64)
    }
}
