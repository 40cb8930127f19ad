//! Progress events emitted by the pipeline.
//!
//! The core never renders progress itself. It pushes [`ProgressEvent`]s into
//! an unbounded channel; a front end holds the receiving half and turns the
//! events into a progress bar, log lines, SSE frames or whatever it needs.
//! A reporter without a subscriber (or whose receiver was dropped) silently
//! discards events.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One step of pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Page `current` of `total` has been extracted
    ExtractionProgress { current: usize, total: usize },
    /// A usable checkpoint already covers `pages` pages
    Resumed { pages: usize },
    /// A single page came back from the backend (not yet committed)
    PageTranslated { page_number: usize },
    /// A batch was committed to the checkpoint
    BatchCommitted { completed: usize, total: usize },
    /// A batch failed; `completed` pages remain checkpointed
    TranslationFailed {
        page_number: usize,
        completed: usize,
        total: usize,
        message: String,
    },
    /// Output page `current` of `total` has been composed
    CompositionProgress { current: usize, total: usize },
    /// The output document is complete
    Finished { pages: usize },
}

/// Sending half of a progress stream. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    /// A reporter that drops every event.
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more
            let _ = tx.send(event);
        }
    }
}

/// Create a connected reporter/receiver pair.
pub fn channel() -> (ProgressReporter, UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressReporter { tx: Some(tx) }, rx)
}
