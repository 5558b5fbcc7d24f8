//! Ad-hoc file audit pipeline.
//!
//! Model-less path: validates the chosen file locally, uploads it as a
//! multipart payload and normalizes the single combined analysis the
//! service returns. The outcome is ephemeral; it never enters the
//! session run map.

use crate::client::{AnalysisService, FileUpload};
use crate::error::ClientError;
use crate::risk::{normalize, CanonicalRiskRecord};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Default cap on upload size, matching the service's own limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Result of one ad-hoc file audit.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    /// Media type as inferred by the server, not the local guess.
    pub media_type: String,
    pub run_id: Option<i64>,
    pub record: CanonicalRiskRecord,
}

pub struct UploadAuditPipeline<S> {
    service: S,
    max_bytes: usize,
}

impl<S: AnalysisService> UploadAuditPipeline<S> {
    pub fn new(service: S, max_bytes: usize) -> Self {
        Self { service, max_bytes }
    }

    /// Submit a file for the combined bias/misinformation/deepfake audit.
    ///
    /// A missing file is a [`ClientError::Validation`] and no network
    /// call is made.
    pub async fn submit(&self, path: Option<&Path>) -> Result<UploadOutcome, ClientError> {
        let Some(path) = path else {
            return Err(ClientError::Validation("Please choose a file.".to_string()));
        };

        // Size check goes first so an oversized file is never read in.
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            ClientError::Validation(format!("cannot read {}: {}", path.display(), e))
        })?;
        if meta.len() > self.max_bytes as u64 {
            return Err(ClientError::Validation(format!(
                "{} is {} bytes, above the {} byte upload limit",
                path.display(),
                meta.len(),
                self.max_bytes
            )));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Validation(format!("cannot read {}: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = guess_media_type(path);
        debug!("Uploading {} ({} bytes, {})", file_name, bytes.len(), mime);

        let response = self
            .service
            .upload_audit(FileUpload {
                file_name,
                mime: mime.to_string(),
                bytes,
            })
            .await?;

        info!(
            "Upload audit complete for {} (media type {})",
            response.file_name, response.media_type
        );

        Ok(UploadOutcome {
            file_name: response.file_name,
            media_type: response.media_type,
            run_id: response.run_id,
            record: normalize(&response.analysis),
        })
    }
}

/// Best-effort content type from the file extension. The server makes
/// the final media-type call; this only labels the multipart part.
fn guess_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => "text/csv",
        "txt" | "md" | "log" | "json" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
