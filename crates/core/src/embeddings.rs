use crate::error::EmbedError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Converts batches of text into fixed-dimension vectors.
///
/// Implementations preserve input order and length, and never retry on their
/// own; retry policy belongs to the ingestion pipeline and the query engine.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            batch_size: 64,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig) -> Result<Self, EmbedError> {
        if config.api_key.trim().is_empty() {
            return Err(EmbedError::Provider("missing api key".to_string()));
        }
        if config.batch_size == 0 {
            return Err(EmbedError::Provider(
                "batch size must be positive".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|error| EmbedError::Provider(format!("invalid api key: {error}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| EmbedError::Provider(format!("http client build failed: {error}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model,
            dimensions: config.dimensions,
            batch_size: config.batch_size,
            timeout: config.timeout,
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: batch,
            dimensions: Some(self.dimensions),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| self.classify(error))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::RateLimited(body));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbedError::Provider(format!(
                "embeddings request failed ({status}): {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| self.classify(error))?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != batch.len() {
            return Err(EmbedError::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                batch.len()
            )));
        }
        for entry in &parsed.data {
            if entry.embedding.len() != self.dimensions {
                return Err(EmbedError::Provider(format!(
                    "provider returned {}-dimensional vector, expected {}",
                    entry.embedding.len(),
                    self.dimensions
                )));
            }
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    fn classify(&self, error: reqwest::Error) -> EmbedError {
        if error.is_timeout() {
            EmbedError::Timeout(self.timeout)
        } else {
            EmbedError::Provider(error.to_string())
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Duplicate texts inside one call are embedded once and rehydrated
        // positionally; batch boundaries stay invisible to the caller.
        let (unique, positions) = dedup_positions(texts);

        let mut vectors = Vec::with_capacity(unique.len());
        for batch in unique.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        Ok(positions.into_iter().map(|slot| vectors[slot].clone()).collect())
    }
}

/// Collapses repeated texts to their first occurrence, remembering the slot
/// each original position maps back to.
fn dedup_positions(texts: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut unique = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut positions = Vec::with_capacity(texts.len());

    for text in texts {
        let slot = match slot_of.get(text.as_str()) {
            Some(slot) => *slot,
            None => {
                unique.push(text.clone());
                slot_of.insert(text.as_str(), unique.len() - 1);
                unique.len() - 1
            }
        };
        positions.push(slot);
    }

    (unique, positions)
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Deterministic local embedder hashing character trigrams into a fixed
/// number of buckets. Offline fallback and test double for the remote
/// provider; not semantically meaningful, but stable and normalized.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl CharacterNgramEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ngram_embedder_is_deterministic() {
        let embedder = CharacterNgramEmbedder::default();
        let texts = vec!["Attention is all you need".to_string()];
        let first = embedder.embed(&texts).await.unwrap();
        let second = embedder.embed(&texts).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn ngram_embedder_preserves_order_and_length() {
        let embedder = CharacterNgramEmbedder { dimensions: 32 };
        let texts = vec![
            "first".to_string(),
            "second".to_string(),
            "first".to_string(),
        ];

        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].len(), 32);
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_rehydrates_positionally() {
        let texts = vec![
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
            "b".to_string(),
        ];

        let (unique, positions) = dedup_positions(&texts);
        assert_eq!(unique, vec!["a", "b", "c"]);
        assert_eq!(positions, vec![0, 1, 0, 2, 1]);
    }

    #[test]
    fn openai_embedder_rejects_blank_api_key() {
        let result = OpenAiEmbedder::new(OpenAiConfig::new("  "));
        assert!(matches!(result, Err(EmbedError::Provider(_))));
    }
}
