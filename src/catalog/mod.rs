//! Catalog service.
//!
//! The orchestration layer between the UI shell and the blob store:
//! - Uploads and bulk deletes with per-item outcomes
//! - Folder lifecycle (files are re-homed to root before a folder goes)
//! - Multi-select state and a client-side upload queue
//! - Cached thumbnails and usage analytics over a transient snapshot

mod queue;
mod selection;
mod service;

pub use queue::{PendingUpload, UploadQueue, UploadTicket};
pub use selection::Selection;
pub use service::Catalog;

use crate::VaultError;

/// One failed item in a batch operation.
#[derive(Debug)]
pub struct ItemFailure {
    /// File name for uploads, file ID for deletes.
    pub key: String,
    pub error: VaultError,
}

/// Outcome of a batch operation. Items are attempted independently.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// IDs of the files that were created or deleted.
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl BatchReport {
    /// True when no item failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
