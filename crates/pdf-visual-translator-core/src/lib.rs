//! PDF Visual Translator Core Library
//!
//! This library provides the core functionality for layout-preserving PDF
//! translation:
//! - Reading-order text extraction and page rasterization (MuPDF)
//! - Translation via Gemini, OpenAI, or DeepSeek through a relay
//! - Resumable runs backed by a checkpoint store (memory and disk)
//! - Reconstruction of translated text over the original page images

pub mod checkpoint;
pub mod chunk;
pub mod config;
pub mod error;
pub mod page;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod translator;
pub mod util;

pub use checkpoint::{Checkpoint, CheckpointStore, DocumentKey};
pub use config::{AppConfig, Lang, Provider, TranslatorConfig};
pub use error::{BackendError, Error, Result, remediation_hint};
pub use page::{PageRecord, TranslatedPageRecord};
pub use pdf::{PageRasterizer, PdfDocument, Reconstructor, TextExtractor};
pub use pipeline::TranslationPipeline;
pub use progress::{ProgressEvent, ProgressReporter};
pub use retry::RetryPolicy;
pub use translator::{Translator, create_translator};

use std::sync::Arc;
use tracing::{info, warn};

/// High-level translator that combines all components
pub struct VisualTranslator {
    config: AppConfig,
    provider: Provider,
    store: Arc<CheckpointStore>,
    pipeline: TranslationPipeline,
    reconstructor: Reconstructor,
    progress: ProgressReporter,
}

impl VisualTranslator {
    /// Create a new translator with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let translator = create_translator(&config.translator)?;
        let store = Arc::new(CheckpointStore::new(&config.checkpoint)?);
        Ok(Self::with_translator(translator, store, config))
    }

    /// Create with a custom translator and checkpoint store
    pub fn with_translator(translator: Arc<dyn Translator>, store: Arc<CheckpointStore>, config: AppConfig) -> Self {
        let provider = translator.provider();
        let pipeline = TranslationPipeline::new(translator, Arc::clone(&store), &config.translator);
        let reconstructor = Reconstructor::new(&config);

        Self {
            config,
            provider,
            store,
            pipeline,
            reconstructor,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Send progress events of every stage to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.pipeline = self.pipeline.with_progress(progress.clone());
        self.reconstructor = self.reconstructor.with_progress(progress.clone());
        self.progress = progress;
        self
    }

    /// Replace the retry policy (tests and impatient callers).
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.pipeline = self.pipeline.with_retry(retry);
        self
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn provider(&self) -> Provider {
        self.provider
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Checkpoint key of `document_id` for this translator's provider.
    pub fn key(&self, document_id: &str) -> DocumentKey {
        DocumentKey::new(document_id, self.provider)
    }

    /// Extract every page's text.
    pub async fn extract(&self, doc: &PdfDocument) -> Result<Vec<PageRecord>> {
        TextExtractor::new(doc).extract_all(&self.progress).await
    }

    /// Translate page 1 only, returning the original and translated text.
    pub async fn preview(&self, doc: &PdfDocument, document_id: &str) -> Result<TranslatedPageRecord> {
        let pages = self.extract(doc).await?;
        self.pipeline.preview(doc, &pages, &self.key(document_id)).await
    }

    /// Translate the whole document (resuming from a checkpoint if one
    /// exists) and compose the output PDF.
    pub async fn translate_document(&self, doc: &PdfDocument, document_id: &str) -> Result<Vec<u8>> {
        let key = self.key(document_id);
        info!("Translating {} ({} pages) as {}", doc.file_name(), doc.page_count(), key);

        let pages = self.extract(doc).await?;
        let translated = self.pipeline.translate_all(doc, &pages, &key).await?;
        let output = self.reconstructor.compose(doc, &translated).await?;

        self.progress.emit(ProgressEvent::Finished {
            pages: translated.len(),
        });
        Ok(output)
    }

    /// Compose whatever is checkpointed for `document_id`.
    ///
    /// Returns `None` when there is no usable checkpoint.
    pub async fn export_partial(&self, doc: &PdfDocument, document_id: &str) -> Result<Option<Vec<u8>>> {
        let Some(checkpoint) = self.store.get(&self.key(document_id)).await? else {
            return Ok(None);
        };

        if !checkpoint.matches(doc) {
            warn!(
                "Checkpoint for {} was taken from different content ({})",
                document_id, checkpoint.file_name
            );
            return Err(Error::Checkpoint(format!(
                "checkpoint for '{document_id}' does not belong to {}",
                doc.file_name()
            )));
        }

        if checkpoint.pages.is_empty() {
            return Ok(None);
        }

        let output = self.reconstructor.export_partial(doc, &checkpoint).await?;
        self.progress.emit(ProgressEvent::Finished {
            pages: checkpoint.completed(),
        });
        Ok(Some(output))
    }

    /// Drop the checkpoint of `document_id`.
    pub async fn clear_checkpoint(&self, document_id: &str) -> Result<()> {
        self.store.clear(&self.key(document_id)).await
    }
}
