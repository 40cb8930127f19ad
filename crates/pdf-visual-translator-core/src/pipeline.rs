//! Translation orchestration: checkpoint resume, batching, chunking, retry.
//!
//! Pages are translated in ascending order, `batch_size` at a time. All
//! calls of a batch run concurrently and are joined before anything is
//! committed, so the checkpoint only ever holds whole batches. When a batch
//! fails, the pages committed so far stay in the checkpoint and the run stops.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, DocumentKey};
use crate::chunk::{join_chunks, split_into_chunks};
use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::page::{PageRecord, TranslatedPageRecord};
use crate::pdf::PdfDocument;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::retry::{RetryPolicy, with_backoff};
use crate::translator::Translator;

/// Drives a translator over the pages of one document at a time.
pub struct TranslationPipeline {
    translator: Arc<dyn Translator>,
    store: Arc<CheckpointStore>,
    retry: RetryPolicy,
    batch_size: usize,
    chunk_limit: Option<usize>,
    progress: ProgressReporter,
}

impl TranslationPipeline {
    pub fn new(translator: Arc<dyn Translator>, store: Arc<CheckpointStore>, config: &TranslatorConfig) -> Self {
        Self {
            translator,
            store,
            retry: RetryPolicy::from_config(config),
            batch_size: config.batch_size.max(1),
            chunk_limit: config.chunk_limit,
            progress: ProgressReporter::disabled(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Translate the first page only and checkpoint it.
    ///
    /// A first page that is already checkpointed is returned without calling
    /// the backend.
    pub async fn preview(
        &self,
        doc: &PdfDocument,
        pages: &[PageRecord],
        key: &DocumentKey,
    ) -> Result<TranslatedPageRecord> {
        let first = pages
            .iter()
            .min_by_key(|p| p.page_number)
            .ok_or_else(|| Error::InvalidInput("document has no pages".to_string()))?;

        let mut done = self.load_prefix(doc, key).await?;
        if let Some(existing) = done.iter().find(|p| p.page_number == first.page_number) {
            debug!("Preview of page {} served from checkpoint", first.page_number);
            return Ok(existing.clone());
        }

        let translated = self
            .translate_page(first)
            .await
            .map_err(|source| Error::Pipeline {
                page: first.page_number,
                completed: done.len(),
                total: pages.len(),
                source: Box::new(source),
            })?;

        let record = TranslatedPageRecord::new(first, translated);
        done.push(record.clone());
        self.store.put(key, doc, &done).await?;

        Ok(record)
    }

    /// Translate every page not already checkpointed.
    ///
    /// Returns all pages in ascending order and clears the checkpoint. On
    /// failure the error is [`Error::Pipeline`] and the checkpoint holds
    /// every page committed before the failing batch.
    pub async fn translate_all(
        &self,
        doc: &PdfDocument,
        pages: &[PageRecord],
        key: &DocumentKey,
    ) -> Result<Vec<TranslatedPageRecord>> {
        let total = pages.len();
        let mut done = self.load_prefix(doc, key).await?;

        if !done.is_empty() {
            info!("Resuming {} from checkpoint ({}/{} pages)", key, done.len(), total);
            self.progress.emit(ProgressEvent::Resumed { pages: done.len() });
        }

        let committed: HashSet<usize> = done.iter().map(|p| p.page_number).collect();
        let mut remaining: Vec<&PageRecord> = pages
            .iter()
            .filter(|p| !committed.contains(&p.page_number))
            .collect();
        remaining.sort_by_key(|p| p.page_number);

        info!(
            "Translating {} pages with {} (batch size {})",
            remaining.len(),
            self.translator.provider(),
            self.batch_size
        );

        for batch in remaining.chunks(self.batch_size) {
            let results = join_all(batch.iter().map(|&page| async move {
                (page, self.translate_page(page).await)
            }))
            .await;

            let mut translated = Vec::with_capacity(results.len());
            let mut failure = None;
            for (page, result) in results {
                match result {
                    Ok(text) => translated.push(TranslatedPageRecord::new(page, text)),
                    Err(e) => {
                        failure.get_or_insert((page.page_number, e));
                    }
                }
            }

            if let Some((page, source)) = failure {
                return Err(self.fail(doc, key, &done, total, page, source).await);
            }

            done.extend(translated);
            self.store.put(key, doc, &done).await?;
            self.progress.emit(ProgressEvent::BatchCommitted {
                completed: done.len(),
                total,
            });
        }

        self.store.clear(key).await?;
        done.sort_by_key(|p| p.page_number);
        Ok(done)
    }

    /// Record a failed batch and build the error reported to the caller.
    async fn fail(
        &self,
        doc: &PdfDocument,
        key: &DocumentKey,
        done: &[TranslatedPageRecord],
        total: usize,
        page: usize,
        source: Error,
    ) -> Error {
        warn!("Translation of {} stopped at page {}: {}", key, page, source);

        if !done.is_empty()
            && let Err(e) = self.store.put(key, doc, done).await
        {
            warn!("Failed to save checkpoint after error: {}", e);
        }

        self.progress.emit(ProgressEvent::TranslationFailed {
            page_number: page,
            completed: done.len(),
            total,
            message: source.to_string(),
        });

        Error::Pipeline {
            page,
            completed: done.len(),
            total,
            source: Box::new(source),
        }
    }

    /// Checkpointed pages usable for this exact document, else nothing.
    async fn load_prefix(&self, doc: &PdfDocument, key: &DocumentKey) -> Result<Vec<TranslatedPageRecord>> {
        match self.store.get(key).await? {
            Some(checkpoint) if checkpoint.matches(doc) => Ok(checkpoint.pages),
            Some(checkpoint) => {
                info!(
                    "Ignoring checkpoint for {}: it was taken from different content ({})",
                    key, checkpoint.file_name
                );
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    /// Translate one page, chunked if the backend needs it, with retry.
    async fn translate_page(&self, page: &PageRecord) -> Result<String> {
        if page.text.trim().is_empty() {
            debug!("Page {} has no text, skipping backend", page.page_number);
            self.progress.emit(ProgressEvent::PageTranslated {
                page_number: page.page_number,
            });
            return Ok(String::new());
        }

        let limit = self.chunk_limit.or_else(|| self.translator.max_chunk_chars());
        let chunks = match limit {
            Some(max) => split_into_chunks(&page.text, max),
            None => vec![page.text.clone()],
        };

        if chunks.len() > 1 {
            debug!("Page {} split into {} chunks", page.page_number, chunks.len());
        }

        // Chunks of one page go strictly one after another
        let mut translated = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let label = format!("page {} chunk {}/{}", page.page_number, i + 1, chunks.len());
            let text = with_backoff(self.retry, &label, || self.translator.translate(chunk)).await?;
            translated.push(text);
        }

        self.progress.emit(ProgressEvent::PageTranslated {
            page_number: page.page_number,
        });
        Ok(join_chunks(&translated))
    }
}
