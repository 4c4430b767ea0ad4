// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DicomwerkError, Result};
use crate::{PageSize, PaperSize};

/// Widest page-button window `validate` accepts.
pub const MAX_PAGE_BUTTONS: usize = 25;

/// What happens to selection flags when a new import replaces the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOnImport {
    /// Leave every flag in place, including ones past the new catalog end.
    #[default]
    Keep,
    /// Drop flags that no longer address a catalog entry.
    Prune,
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rows per page when a session starts.
    pub page_size: PageSize,
    /// Width of the sliding page-button window.
    pub max_page_buttons: usize,
    /// Edge length in pixels of the square off-screen render surface.
    pub canvas_size: u32,
    /// Fixed wait for engines that never signal render completion.
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for an engine's render-complete signal.
    pub render_timeout_ms: u64,
    /// Endpoint of the remote noise-reduction service.
    pub filter_endpoint: String,
    /// File name of the assembled document.
    pub output_name: String,
    /// Directory the document is saved into (current directory if unset).
    pub output_dir: Option<PathBuf>,
    /// Paper size of the assembled document.
    pub paper_size: PaperSize,
    pub selection_on_import: SelectionOnImport,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Five,
            max_page_buttons: 5,
            canvas_size: 512,
            settle_delay_ms: 800,
            render_timeout_ms: 5_000,
            filter_endpoint: "http://127.0.0.1:8000/process-dicom/".into(),
            output_name: "selected-dicom-images.pdf".into(),
            output_dir: None,
            paper_size: PaperSize::A4,
            selection_on_import: SelectionOnImport::Keep,
        }
    }
}

impl AppConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// Full path of the assembled document.
    pub fn output_path(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(&self.output_name),
            None => PathBuf::from(&self.output_name),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_BUTTONS).contains(&self.max_page_buttons) {
            return Err(DicomwerkError::Config(format!(
                "max_page_buttons must be between 1 and {MAX_PAGE_BUTTONS}"
            )));
        }
        if self.canvas_size == 0 {
            return Err(DicomwerkError::Config("canvas_size must be non-zero".into()));
        }
        if self.output_name.trim().is_empty() {
            return Err(DicomwerkError::Config("output_name must not be empty".into()));
        }
        if !(self.filter_endpoint.starts_with("http://")
            || self.filter_endpoint.starts_with("https://"))
        {
            return Err(DicomwerkError::Config(format!(
                "filter_endpoint must be an http(s) URL (got {:?})",
                self.filter_endpoint
            )));
        }
        Ok(())
    }
}
