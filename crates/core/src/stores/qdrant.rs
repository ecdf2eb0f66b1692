use crate::error::StoreError;
use crate::models::{QueryFilter, RecordMetadata, ScoredRecord, VectorRecord};
use crate::traits::{UpsertOutcome, VectorStore};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP qdrant backend. The collection is created with cosine distance so
/// ranking matches the in-process store; tie order among equal scores follows
/// the backend's own ordering.
pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
    timeout: Duration,
}

impl QdrantStore {
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
            timeout: REQUEST_TIMEOUT,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.collection_url())
            .timeout(self.timeout)
            .json(&json!({
                "vectors": { "size": self.vector_size, "distance": "Cosine" }
            }))
            .send()
            .await?;

        // an existing collection answers conflict; both outcomes leave a
        // usable collection behind
        if response.status().is_success() || response.status() == StatusCode::CONFLICT {
            return Ok(());
        }

        Err(StoreError::Backend {
            backend: "qdrant".to_string(),
            details: response.status().to_string(),
        })
    }

    fn document_filter(document_id: &str) -> Value {
        json!({
            "must": [{ "key": "document_id", "match": { "value": document_id } }]
        })
    }

    fn query_filter(filter: &QueryFilter) -> Value {
        let mut must = Vec::new();
        if let Some(document_id) = &filter.document_id {
            must.push(json!({ "key": "document_id", "match": { "value": document_id } }));
        }
        if let Some(source_path) = &filter.source_path {
            must.push(json!({ "key": "source_path", "match": { "value": source_path } }));
        }
        json!({ "must": must })
    }

    async fn count_matching(&self, filter: Option<Value>) -> Result<u64, StoreError> {
        let mut body = json!({ "exact": true });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Backend {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn dimensions(&self) -> usize {
        self.vector_size
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertOutcome, StoreError> {
        let mut outcome = UpsertOutcome::default();
        let mut points = Vec::with_capacity(records.len());

        for record in records {
            if record.embedding.len() != self.vector_size {
                let error = StoreError::Dimension {
                    id: record.id.clone(),
                    expected: self.vector_size,
                    actual: record.embedding.len(),
                };
                outcome.rejected.push((record.id, error));
                continue;
            }

            points.push(json!({
                "id": record.id,
                "vector": record.embedding,
                "payload": {
                    "document_id": record.metadata.document_id,
                    "source_path": record.metadata.source_path,
                    "chunk_index": record.metadata.chunk_index,
                    "text": record.text,
                },
            }));
        }

        if points.is_empty() {
            return Ok(outcome);
        }

        let written = points.len() as u64;
        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .timeout(self.timeout)
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Backend {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        outcome.written = written;
        Ok(outcome)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        if vector.len() != self.vector_size {
            return Err(StoreError::Dimension {
                id: "query".to_string(),
                expected: self.vector_size,
                actual: vector.len(),
            });
        }

        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
            "with_vector": true,
        });
        if let Some(filter) = filter.filter(|wanted| !wanted.is_empty()) {
            body["filter"] = Self::query_filter(filter);
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Backend {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::with_capacity(hits.len());
        for hit in hits {
            let id = hit
                .pointer("/id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
            let embedding = hit
                .pointer("/vector")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_f64)
                        .map(|value| value as f32)
                        .collect()
                })
                .unwrap_or_default();
            let text = hit
                .pointer("/payload/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let metadata = RecordMetadata {
                document_id: hit
                    .pointer("/payload/document_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                source_path: hit
                    .pointer("/payload/source_path")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                chunk_index: hit
                    .pointer("/payload/chunk_index")
                    .and_then(Value::as_u64)
                    .unwrap_or_default(),
            };

            result.push(ScoredRecord {
                record: VectorRecord {
                    id,
                    embedding,
                    text,
                    metadata,
                },
                score,
            });
        }

        Ok(result)
    }

    async fn delete_document(&self, document_id: &str) -> Result<u64, StoreError> {
        let filter = Self::document_filter(document_id);
        let stale = self.count_matching(Some(filter.clone())).await?;
        if stale == 0 {
            return Ok(0);
        }

        let response = self
            .client
            .post(format!("{}/points/delete?wait=true", self.collection_url()))
            .timeout(self.timeout)
            .json(&json!({ "filter": filter }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Backend {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(stale)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.collection_url())
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(StoreError::Backend {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        self.ensure_collection().await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.count_matching(None).await
    }
}
