use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::UploadEvent;
use crate::catalog::{AvatarCategory, AvatarItem};
use crate::validation::{ValidationError, ValidationResult};

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["glb", "gltf"];
pub const SIMULATED_UPLOAD_DELAY: Duration = Duration::from_millis(1500);

/// A file the user picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    path: PathBuf,
    size: u64,
}

impl PendingFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Reads the size from disk
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path)?.len();
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let extension = self.extension().unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ValidationError::UnsupportedFile { extension });
        }
        if self.size > MAX_UPLOAD_BYTES {
            return Err(ValidationError::FileTooLarge {
                size: self.size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}

/// Editable state of the upload modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub file: Option<PendingFile>,
    pub name: String,
    pub category: AvatarCategory,
}

impl Default for UploadDraft {
    fn default() -> Self {
        Self {
            file: None,
            name: String::new(),
            category: AvatarCategory::Hats,
        }
    }
}

impl UploadDraft {
    /// Name defaults to the file stem, category to `Hats`
    pub fn new(file: PendingFile) -> Self {
        Self {
            name: file.stem(),
            file: Some(file),
            category: AvatarCategory::Hats,
        }
    }

    pub fn validate(&self) -> ValidationResult<UploadRequest> {
        let file = self.file.as_ref().ok_or(ValidationError::MissingFile)?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        file.validate()?;
        Ok(UploadRequest {
            file: file.clone(),
            name: name.to_string(),
            category: self.category,
        })
    }
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: PendingFile,
    pub name: String,
    pub category: AvatarCategory,
}

impl UploadRequest {
    pub fn into_item(self) -> AvatarItem {
        let id = format!("user-item-{}", Uuid::new_v4());
        let model_url = format!("file://{}", self.file.path.display());
        AvatarItem::new(id, self.name, model_url, self.category)
    }
}

/// Runs simulated uploads on the tokio runtime and hands results back to
/// the UI thread, which drains them with [`poll`](Self::poll) each frame.
pub struct Uploader {
    runtime: Handle,
    delay: Duration,
    event_tx: Sender<UploadEvent>,
    event_rx: Receiver<UploadEvent>,
    in_flight: Option<(Uuid, JoinHandle<()>)>,
}

impl Uploader {
    pub fn new(runtime: Handle) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            runtime,
            delay: SIMULATED_UPLOAD_DELAY,
            event_tx,
            event_rx,
            in_flight: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validate the draft and start uploading it. A validation error leaves
    /// the uploader untouched. Starting while busy cancels the earlier upload.
    pub fn start(&mut self, draft: &UploadDraft) -> ValidationResult<Uuid> {
        let request = draft.validate()?;
        self.cancel();

        let ticket = Uuid::new_v4();
        let delay = self.delay;
        let tx = self.event_tx.clone();
        info!(
            "Uploading '{}' ({} bytes) as {}",
            request.name,
            request.file.size(),
            request.category
        );

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let event = match tokio::fs::metadata(request.file.path()).await {
                Ok(_) => UploadEvent::complete(ticket, request.into_item()),
                Err(e) => UploadEvent::failed(
                    ticket,
                    format!("{}: {}", request.file.path().display(), e),
                ),
            };
            if tx.send(event).is_err() {
                debug!("Upload {} finished after the uploader was dropped", ticket);
            }
        });

        self.in_flight = Some((ticket, handle));
        Ok(ticket)
    }

    /// Next result for the current upload, if one has arrived. Results from
    /// cancelled uploads are discarded.
    pub fn poll(&mut self) -> Option<UploadEvent> {
        while let Ok(event) = self.event_rx.try_recv() {
            let current = self.in_flight.as_ref().map(|(ticket, _)| *ticket);
            if current != Some(event.ticket()) {
                debug!("Dropping stale upload result {}", event.ticket());
                continue;
            }
            self.in_flight = None;
            match &event {
                UploadEvent::Complete(done) => info!("Upload complete: {}", done.item.id),
                UploadEvent::Failed(failed) => warn!("Upload failed: {}", failed.reason),
            }
            return Some(event);
        }
        None
    }

    pub fn cancel(&mut self) {
        if let Some((ticket, handle)) = self.in_flight.take() {
            handle.abort();
            debug!("Upload {} cancelled", ticket);
        }
    }
}

impl Drop for Uploader {
    fn drop(&mut self) {
        self.cancel();
    }
}
