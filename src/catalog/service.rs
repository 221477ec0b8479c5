//! The catalog service itself.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::analytics::UsageStats;
use crate::config::Config;
use crate::store::{BlobStore, FileBlob, StoredFile, StoredFolder};
use crate::thumbnail::{placeholder_data_uri, ThumbnailRenderer};
use crate::{Result, VaultError};

use super::{BatchReport, ItemFailure, Selection, UploadQueue};

/// Catalog over a blob store.
///
/// Holds a non-authoritative snapshot of the last successful read. Mutations
/// patch the snapshot after the store confirms them and leave it untouched
/// on failure.
pub struct Catalog<'a> {
    store: &'a BlobStore,
    renderer: ThumbnailRenderer,
    advisory_file_limit: u64,
    max_upload_bytes: Option<u64>,
    files: Vec<StoredFile>,
    folders: Vec<StoredFolder>,
    selection: Selection,
    thumbnails: HashMap<String, String>,
}

impl<'a> Catalog<'a> {
    /// Create a catalog with default settings and an empty snapshot.
    pub fn new(store: &'a BlobStore) -> Self {
        let defaults = Config::default();
        Self {
            store,
            renderer: ThumbnailRenderer::new(&defaults.thumbnails),
            advisory_file_limit: defaults.catalog.advisory_file_limit,
            max_upload_bytes: defaults.catalog.max_upload_bytes(),
            files: Vec::new(),
            folders: Vec::new(),
            selection: Selection::new(),
            thumbnails: HashMap::new(),
        }
    }

    /// Apply thumbnail and catalog settings.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.renderer = ThumbnailRenderer::new(&config.thumbnails);
        self.advisory_file_limit = config.catalog.advisory_file_limit;
        self.max_upload_bytes = config.catalog.max_upload_bytes();
        self.thumbnails.clear();
        self
    }

    /// Override the per-file upload limit.
    pub fn with_max_upload_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_upload_bytes = max_bytes;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &'a BlobStore {
        self.store
    }

    // Snapshot

    /// Re-read files and folders from the store.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&mut self) -> Result<()> {
        let files = self.store.list_files().await?;
        let folders = self.store.list_folders().await?;

        let live: HashSet<&str> = files.iter().map(|f| f.id.as_str()).collect();
        self.selection.retain(|id| live.contains(id));
        self.thumbnails.retain(|id, _| live.contains(id.as_str()));

        debug!(files = files.len(), folders = folders.len(), "catalog refreshed");
        self.files = files;
        self.folders = folders;
        Ok(())
    }

    pub fn files(&self) -> &[StoredFile] {
        &self.files
    }

    pub fn folders(&self) -> &[StoredFolder] {
        &self.folders
    }

    /// Find a file in the snapshot.
    pub fn file(&self, id: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Find a folder in the snapshot.
    pub fn folder(&self, id: &str) -> Option<&StoredFolder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// Files shown in a folder view (None = root).
    ///
    /// A file pointing at a folder that no longer exists is shown at root.
    pub fn files_in_folder(&self, folder_id: Option<&str>) -> Vec<&StoredFile> {
        let known: HashSet<&str> = self.folders.iter().map(|f| f.id.as_str()).collect();
        self.files
            .iter()
            .filter(|file| {
                let effective = file
                    .folder_id
                    .as_deref()
                    .filter(|id| known.contains(id));
                effective == folder_id
            })
            .collect()
    }

    /// Number of files shown in a folder view.
    pub fn folder_file_count(&self, folder_id: &str) -> usize {
        self.files_in_folder(Some(folder_id)).len()
    }

    /// Usage figures over the current snapshot.
    pub fn usage(&self) -> UsageStats {
        UsageStats::compute(&self.files, self.advisory_file_limit, Utc::now())
    }

    // Selection

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    // Files

    /// Upload blobs into `folder_id` (None = root).
    ///
    /// Every blob is attempted independently; per-item failures are
    /// reported and do not stop the rest of the batch.
    ///
    /// # Errors
    /// - `Validation` when `blobs` is empty
    /// - `NotFound` when the target folder does not exist
    pub async fn upload_files(
        &mut self,
        blobs: Vec<FileBlob>,
        folder_id: Option<&str>,
    ) -> Result<BatchReport> {
        if blobs.is_empty() {
            return Err(VaultError::Validation("no files to upload".to_string()));
        }
        self.ensure_folder(folder_id).await?;
        self.check_advisory_limit(blobs.len()).await;

        let mut report = BatchReport::default();
        for blob in blobs {
            self.upload_one(blob, folder_id, &mut report).await;
        }

        info!(
            uploaded = report.succeeded.len(),
            failed = report.failed.len(),
            "upload batch finished"
        );
        Ok(report)
    }

    /// Dispatch everything still in `queue`.
    ///
    /// Items whose folder has disappeared fail individually with `NotFound`.
    pub async fn upload_queue(&mut self, queue: &mut UploadQueue) -> BatchReport {
        let pending = queue.drain();
        let mut report = BatchReport::default();
        if pending.is_empty() {
            return report;
        }
        self.check_advisory_limit(pending.len()).await;

        for item in pending {
            if let Err(error) = self.ensure_folder(item.folder_id.as_deref()).await {
                report.failed.push(ItemFailure {
                    key: item.blob.name,
                    error,
                });
                continue;
            }
            self.upload_one(item.blob, item.folder_id.as_deref(), &mut report)
                .await;
        }

        info!(
            uploaded = report.succeeded.len(),
            failed = report.failed.len(),
            "upload queue drained"
        );
        report
    }

    /// Delete a file and drop it from the snapshot and selection.
    pub async fn delete_file(&mut self, id: &str) -> Result<()> {
        self.store.delete_file(id).await?;
        self.forget_file(id);
        Ok(())
    }

    /// Move files to a folder (None = root) and clear the selection.
    ///
    /// Unknown file IDs are skipped. Returns the number of files moved.
    pub async fn move_files(&mut self, ids: &[String], folder_id: Option<&str>) -> Result<u64> {
        self.ensure_folder(folder_id).await?;
        let moved = self.store.move_files(ids, folder_id).await?;

        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for file in self.files.iter_mut().filter(|f| targets.contains(f.id.as_str())) {
            file.folder_id = folder_id.map(str::to_string);
        }
        self.selection.clear();

        debug!(moved, folder = ?folder_id, "files moved");
        Ok(moved)
    }

    /// Delete files concurrently, one independent delete per ID.
    pub async fn bulk_delete(&mut self, ids: &[String]) -> BatchReport {
        let store = self.store;
        let outcomes = join_all(ids.iter().map(|id| async move {
            (id, store.delete_file(id).await)
        }))
        .await;

        let mut report = BatchReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    self.forget_file(id);
                    report.succeeded.push(id.clone());
                }
                Err(error) => {
                    warn!(file_id = %id, error = %error, "bulk delete item failed");
                    report.failed.push(ItemFailure {
                        key: id.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Delete every selected file and clear the selection.
    pub async fn bulk_delete_selected(&mut self) -> BatchReport {
        let ids = self.selection.ids();
        let report = self.bulk_delete(&ids).await;
        self.selection.clear();
        report
    }

    /// Preview for a file as a data URI.
    ///
    /// Rendered previews are cached for the lifetime of the catalog. If the
    /// drawing surface is unavailable the static placeholder is returned
    /// instead of an error.
    pub async fn thumbnail(&mut self, id: &str) -> Result<String> {
        if let Some(uri) = self.thumbnails.get(id) {
            return Ok(uri.clone());
        }

        let (data, content_type) = match self.file(id) {
            Some(file) => (file.blob.data.clone(), file.blob.content_type.clone()),
            None => {
                let file = self
                    .store
                    .get_file(id)
                    .await?
                    .ok_or_else(|| VaultError::NotFound("file".to_string()))?;
                (file.blob.data, file.blob.content_type)
            }
        };

        let renderer = self.renderer.clone();
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&data, &content_type))
            .await
            .map_err(|e| VaultError::RenderSurfaceUnavailable(e.to_string()))
            .and_then(|result| result);

        match rendered {
            Ok(uri) => {
                self.thumbnails.insert(id.to_string(), uri.clone());
                Ok(uri)
            }
            Err(VaultError::RenderSurfaceUnavailable(reason)) => {
                warn!(file_id = %id, %reason, "thumbnail unavailable, using placeholder");
                Ok(placeholder_data_uri().to_string())
            }
            Err(e) => Err(e),
        }
    }

    // Folders

    /// Create a folder. Names are trimmed and must not be blank.
    pub async fn create_folder(&mut self, name: &str) -> Result<StoredFolder> {
        let name = validate_folder_name(name)?;
        let id = self.store.put_folder(name).await?;
        let folder = self
            .store
            .get_folder(&id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;

        info!(folder_id = %folder.id, name = %folder.name, "folder created");
        self.folders.push(folder.clone());
        Ok(folder)
    }

    /// Rename a folder. Names are trimmed and must not be blank.
    pub async fn rename_folder(&mut self, id: &str, new_name: &str) -> Result<StoredFolder> {
        let new_name = validate_folder_name(new_name)?;
        let folder = self.store.rename_folder(id, new_name).await?;

        if let Some(cached) = self.folders.iter_mut().find(|f| f.id == id) {
            *cached = folder.clone();
        }
        Ok(folder)
    }

    /// Delete a folder after moving its files to root.
    ///
    /// The files are re-homed first so no stored file ever references a
    /// deleted folder. If the move fails the folder is left in place.
    pub async fn delete_folder(&mut self, id: &str) -> Result<()> {
        let members: Vec<String> = self
            .store
            .list_files_by_folder(Some(id))
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();

        if !members.is_empty() {
            self.store.move_files(&members, None).await?;
            for file in self
                .files
                .iter_mut()
                .filter(|f| f.folder_id.as_deref() == Some(id))
            {
                file.folder_id = None;
            }
        }

        self.store.delete_folder(id).await?;
        self.folders.retain(|f| f.id != id);

        info!(folder_id = %id, rehomed = members.len(), "folder deleted");
        Ok(())
    }

    // Internals

    async fn upload_one(&mut self, blob: FileBlob, folder_id: Option<&str>, report: &mut BatchReport) {
        if let Some(limit) = self.max_upload_bytes {
            if blob.size() > limit {
                report.failed.push(ItemFailure {
                    key: blob.name,
                    error: VaultError::Validation(format!(
                        "file exceeds the {} upload limit",
                        crate::format_size(limit)
                    )),
                });
                return;
            }
        }

        match self.store.put_file(&blob, folder_id).await {
            Ok(id) => {
                match self.store.get_file(&id).await {
                    Ok(Some(file)) => self.files.push(file),
                    Ok(None) => {}
                    Err(e) => debug!(file_id = %id, error = %e, "snapshot not patched after upload"),
                }
                report.succeeded.push(id);
            }
            Err(error) => {
                warn!(name = %blob.name, error = %error, "upload item failed");
                report.failed.push(ItemFailure {
                    key: blob.name,
                    error,
                });
            }
        }
    }

    async fn ensure_folder(&self, folder_id: Option<&str>) -> Result<()> {
        match folder_id {
            None => Ok(()),
            Some(id) => match self.store.get_folder(id).await? {
                Some(_) => Ok(()),
                None => Err(VaultError::NotFound("folder".to_string())),
            },
        }
    }

    /// Warn when `incoming` more files would pass the advisory limit.
    ///
    /// Counts against the store so an unrefreshed snapshot does not hide files.
    async fn check_advisory_limit(&self, incoming: usize) -> bool {
        let stored = match self.store.count_files().await {
            Ok(count) => count,
            Err(e) => {
                debug!(error = %e, "file count unavailable, using snapshot");
                self.files.len() as u64
            }
        };
        let projected = stored.saturating_add(incoming as u64);
        let over = projected > self.advisory_file_limit;
        if over {
            warn!(
                files = projected,
                limit = self.advisory_file_limit,
                "advisory file limit reached"
            );
        }
        over
    }

    fn forget_file(&mut self, id: &str) {
        self.files.retain(|f| f.id != id);
        self.selection.deselect(id);
        self.thumbnails.remove(id);
    }
}

fn validate_folder_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultError::Validation(
            "folder name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
