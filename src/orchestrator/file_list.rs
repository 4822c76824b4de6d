//! Output file list controller.
//!
//! Keeps the client-visible list of generated files in step with the registry, deletes
//! entries, and submits uploads. It never draws anything: every visible effect is an
//! `AppEvent` sent to whichever presentation layer is attached.

use super::validate::{validate_upload, ValidationError};
use crate::engine::{ApiClient, ApiError};
use crate::model::{AppEvent, OutputFile, UploadRequest, UploadResult};
use crate::view::{render_error_notice, render_file_list};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error as ThisError;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

const UPLOAD_FAILED: &str = "Upload failed";
const DELETE_FAILED: &str = "Failed to delete file";
const LIST_FAILED: &str = "Failed to load output files";
const DOWNLOAD_FAILED: &str = "Download failed";

#[derive(ThisError, Debug)]
pub enum SubmitError {
    #[error("an upload is already in progress")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct FileListController {
    client: ApiClient,
    required_extension: String,
    event_tx: UnboundedSender<AppEvent>,
    files: Mutex<Vec<OutputFile>>,
    submitting: AtomicBool,
    refreshes_in_flight: AtomicUsize,
}

impl FileListController {
    pub fn new(
        client: ApiClient,
        required_extension: impl Into<String>,
        event_tx: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            client,
            required_extension: required_extension.into(),
            event_tx,
            files: Mutex::new(Vec::new()),
            submitting: AtomicBool::new(false),
            refreshes_in_flight: AtomicUsize::new(0),
        }
    }

    fn emit(&self, ev: AppEvent) {
        let _ = self.event_tx.send(ev);
    }

    /// Snapshot of the last successfully fetched listing.
    pub fn files(&self) -> Vec<OutputFile> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshes_in_flight.load(Ordering::Relaxed) > 0
    }

    /// Re-fetch the registry and replace the local listing wholesale.
    ///
    /// Refreshes are not serialized; whichever completes last owns the rendered list.
    /// On failure the local listing is kept and an error notice replaces the rendered list.
    pub async fn refresh(&self) -> Result<Vec<OutputFile>, ApiError> {
        self.refreshes_in_flight.fetch_add(1, Ordering::Relaxed);
        let _done = scopeguard::guard((), |_| {
            self.refreshes_in_flight.fetch_sub(1, Ordering::Relaxed);
        });

        match self.client.list_output_files().await {
            Ok(files) => {
                info!(count = files.len(), "output files refreshed");
                // Held across both events so the listing and the rendered list agree
                // when refreshes overlap.
                let mut local = self
                    .files
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                *local = files.clone();
                self.emit(AppEvent::FilesChanged(files.clone()));
                self.emit(AppEvent::ListRendered(render_file_list(&files)));
                drop(local);
                Ok(files)
            }
            Err(e) => {
                warn!(error = %e, "refreshing output files failed");
                self.emit(AppEvent::ListRendered(render_error_notice(
                    &e.user_message(LIST_FAILED),
                )));
                Err(e)
            }
        }
    }

    /// Delete `name` on the server, then re-fetch. A failed delete leaves the listing
    /// alone and does not refresh.
    pub async fn remove(&self, name: &str) -> Result<(), ApiError> {
        match self.client.delete_file(name).await {
            Ok(resp) => {
                info!(name, "output file deleted");
                if let Some(message) = resp.message {
                    self.emit(AppEvent::Info(message));
                }
                // A failed follow-up refresh is already reported via the list notice.
                let _ = self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!(name, error = %e, "delete failed");
                self.emit(AppEvent::Alert(e.user_message(DELETE_FAILED)));
                Err(e)
            }
        }
    }

    /// Validate and post an upload. Only one submission may be in flight; the submit
    /// control and processing indicator are restored on every exit path.
    pub async fn submit(&self, req: UploadRequest) -> Result<UploadResult, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::Busy);
        }
        if let Err(e) = validate_upload(&req, &self.required_extension) {
            self.emit(AppEvent::Alert(e.to_string()));
            return Err(e.into());
        }
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::Busy);
        }

        self.emit(AppEvent::SubmitControl { enabled: false });
        self.emit(AppEvent::Processing { visible: true });
        let restore = scopeguard::guard((), |_| {
            self.submitting.store(false, Ordering::Release);
            self.emit(AppEvent::SubmitControl { enabled: true });
            self.emit(AppEvent::Processing { visible: false });
        });

        let result = match self.client.upload(&req).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, files = req.files.len(), "upload failed");
                self.emit(AppEvent::Alert(e.user_message(UPLOAD_FAILED)));
                return Err(e.into());
            }
        };

        info!(
            files = req.files.len(),
            generated = result.files.len(),
            "upload completed"
        );
        self.emit(AppEvent::UploadCompleted(result.clone()));
        drop(restore);

        let _ = self.refresh().await;
        Ok(result)
    }

    /// Save the artifact listed under `name` into `dest_dir`.
    pub async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let res = self.download_inner(name, dest_dir).await;
        match &res {
            Ok(path) => {
                info!(name, dest = %path.display(), "downloaded");
                self.emit(AppEvent::Info(format!("Saved: {}", path.display())));
            }
            Err(e) => {
                warn!(name, error = %e, "download failed");
                self.emit(AppEvent::Alert(e.user_message(DOWNLOAD_FAILED)));
            }
        }
        res
    }

    async fn download_inner(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let file = self
            .files()
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ApiError::UnknownFile(name.to_string()))?;
        // Never let a registry name escape the destination directory.
        let local_name = Path::new(&file.name)
            .file_name()
            .ok_or_else(|| ApiError::UnknownFile(file.name.clone()))?;
        let dest = dest_dir.join(local_name);
        self.client.download(&file.path, &dest).await?;
        Ok(dest)
    }
}
