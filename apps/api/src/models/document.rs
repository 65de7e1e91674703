use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A rendered resume on disk. One per successful generation request.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub request_id: Uuid,
    pub pdf_path: PathBuf,
    pub html_path: PathBuf,
    pub generated_at: DateTime<Utc>,
}

impl RenderedDocument {
    /// Removes both files written for this document. Missing files are ignored.
    pub async fn remove_files(&self) {
        for path in [&self.pdf_path, &self.html_path] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {e}", path.display());
                }
            }
        }
    }
}
