//! HTML→PDF conversion through an external `wkhtmltopdf` process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::render::RenderError;

/// Converts an HTML file on disk into a PDF file on disk.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError>;
}

/// Options passed on every invocation: A4, UTF-8, print-media CSS.
const CONVERTER_ARGS: &[&str] = &[
    "--page-size",
    "A4",
    "--encoding",
    "UTF-8",
    "--print-media-type",
    "--quiet",
];

pub struct WkhtmltopdfConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl WkhtmltopdfConverter {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn command(&self, html_path: &Path, pdf_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(CONVERTER_ARGS)
            .arg(html_path)
            .arg(pdf_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl PdfConverter for WkhtmltopdfConverter {
    async fn convert(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        debug!(
            "Running {} on {} -> {}",
            self.binary.display(),
            html_path.display(),
            pdf_path.display()
        );

        let child = self.command(html_path, pdf_path).spawn().map_err(|e| {
            RenderError::RenderFailure(format!(
                "could not start converter '{}': {e}",
                self.binary.display()
            ))
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                RenderError::RenderFailure(format!(
                    "converter timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| RenderError::RenderFailure(format!("converter I/O error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::RenderFailure(format!(
                "converter exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
