use crate::chunking;
use crate::embeddings::Embedder;
use crate::error::{EmbedError, IngestError};
use crate::extractor::TextExtractor;
use crate::models::{
    record_id_for, DocumentFailure, IngestOptions, IngestReport, RecordMetadata, VectorRecord,
};
use crate::traits::VectorStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Backoff policy shared by the ingestion pipeline and the query engine; the
/// embedder itself never retries.
pub(crate) async fn embed_with_backoff(
    embedder: &dyn Embedder,
    texts: &[String],
    max_attempts: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let mut attempt = 0usize;
    loop {
        match embedder.embed(texts).await {
            Ok(vectors) => return Ok(vectors),
            Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;
                let delay = backoff_delay(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying embedding request"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

fn backoff_delay(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

/// Orchestrates extract, chunk, embed, and upsert. One bad document never
/// aborts a folder run; its failure lands in the report instead.
pub struct IngestPipeline {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        options: IngestOptions,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
            options,
        }
    }

    pub async fn ingest_folder(&self, folder: &Path) -> Result<IngestReport, IngestError> {
        let files = discover_pdf_files(folder);
        if files.is_empty() {
            return Err(IngestError::Config(format!(
                "no pdf files found in {}",
                folder.display()
            )));
        }

        let mut report = IngestReport::default();
        for path in files {
            match self.ingest_document(&path).await {
                Ok((written, skipped)) => {
                    report.chunks_written += written;
                    report.chunks_skipped += skipped;
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "document skipped");
                    report.errors.push(DocumentFailure {
                        source_path: path.to_string_lossy().to_string(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        info!(
            chunks_written = report.chunks_written,
            chunks_skipped = report.chunks_skipped,
            failed_documents = report.errors.len(),
            "folder ingestion finished"
        );
        Ok(report)
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        match self.ingest_document(path).await {
            Ok((written, skipped)) => {
                report.chunks_written = written;
                report.chunks_skipped = skipped;
            }
            Err(error) => report.errors.push(DocumentFailure {
                source_path: path.to_string_lossy().to_string(),
                reason: error.to_string(),
            }),
        }
        Ok(report)
    }

    async fn ingest_document(&self, path: &Path) -> Result<(u64, u64), IngestError> {
        let document = self.extractor.extract(path)?;
        let chunks: Vec<_> = chunking::chunk(
            &document.text,
            self.options.chunk_size,
            self.options.chunk_overlap,
        )?
        .collect();

        if chunks.is_empty() {
            debug!(source = %document.source_path, "document produced no chunks");
            return Ok((0, 0));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = embed_with_backoff(
            self.embedder.as_ref(),
            &texts,
            self.options.max_embed_attempts,
        )
        .await?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord {
                id: record_id_for(&document.document_id, chunk.index),
                embedding,
                text: chunk.text.clone(),
                metadata: RecordMetadata {
                    document_id: document.document_id.clone(),
                    source_path: document.source_path.clone(),
                    chunk_index: chunk.index,
                },
            })
            .collect();

        // a shrunk document must not leave stale higher-index records behind
        let stale = self.store.delete_document(&document.document_id).await?;
        if stale > 0 {
            debug!(document_id = %document.document_id, stale, "cleared prior records");
        }

        let outcome = self.store.upsert(records).await?;
        for (id, error) in &outcome.rejected {
            warn!(record_id = %id, error = %error, "record rejected by store");
        }

        info!(
            source = %document.source_path,
            pages = document.page_count,
            chunks = outcome.written,
            "document ingested"
        );
        Ok((outcome.written, outcome.rejected.len() as u64))
    }
}
