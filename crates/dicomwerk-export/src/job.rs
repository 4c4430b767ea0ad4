// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export jobs, per-image pipeline stages, and the report an export returns.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use dicomwerk_catalog::SelectionIndex;
use dicomwerk_core::{FilteredImage, ImageId, ImageReference, JobId};
use dicomwerk_document::PageKind;
use tracing::warn;

/// One selected image, with the catalog position it is labelled by.
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub index: usize,
    pub image: ImageReference,
}

/// Everything one export needs, snapshotted when the export starts.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub id: JobId,
    /// Selected images in ascending catalog order.
    pub items: Vec<ExportItem>,
    pub annotation: String,
    pub filtered: Option<FilteredImage>,
    /// Selected positions with no catalog entry behind them.
    pub dangling: Vec<usize>,
    pub created_at: DateTime<Utc>,
}

impl ExportJob {
    /// Snapshot the selected part of `catalog`.
    ///
    /// Items follow catalog order, never the order flags were toggled in.
    /// Selected positions past the end of the catalog are left out and
    /// recorded in [`ExportJob::dangling`].
    pub fn plan(
        catalog: &[ImageReference],
        selection: &SelectionIndex,
        annotation: impl Into<String>,
        filtered: Option<FilteredImage>,
    ) -> Self {
        let mut items = Vec::new();
        let mut dangling = Vec::new();
        for index in selection.selected() {
            match catalog.get(index) {
                Some(image) => items.push(ExportItem {
                    index,
                    image: image.clone(),
                }),
                None => dangling.push(index),
            }
        }
        if !dangling.is_empty() {
            warn!(
                ?dangling,
                catalog_len = catalog.len(),
                "selection points past the end of the catalog"
            );
        }

        Self {
            id: JobId::new(),
            items,
            annotation: annotation.into(),
            filtered,
            dangling,
            created_at: Utc::now(),
        }
    }

    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.index).collect()
    }
}

/// Where one image is in the render-capture-append pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStage {
    Idle,
    SurfaceAcquired,
    Decoding,
    Rendering,
    Settling,
    Capturing,
    /// Placing the captured frame on its own page.
    Appending,
    PageAppended,
    SurfaceReleased,
    Failed,
}

impl std::fmt::Display for ImageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SurfaceAcquired => "surface-acquired",
            Self::Decoding => "decoding",
            Self::Rendering => "rendering",
            Self::Settling => "settling",
            Self::Capturing => "capturing",
            Self::Appending => "appending",
            Self::PageAppended => "page-appended",
            Self::SurfaceReleased => "surface-released",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A selected image that did not make it into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub index: usize,
    pub image: ImageId,
    /// The stage that was in progress when the failure happened.
    pub stage: ImageStage,
    pub detail: String,
}

/// Progress notifications sent while an export runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    ImageStarted { index: usize },
    /// An image entered `stage` of the pipeline.
    Stage { index: usize, stage: ImageStage },
    ImageSkipped(ImageFailure),
    Saved { path: PathBuf, pages: usize },
}

/// Outcome of a completed export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub job_id: JobId,
    pub output_path: PathBuf,
    /// Pages of the saved document, in order.
    pub pages: Vec<PageKind>,
    /// Number of selected images the pipeline attempted.
    pub attempted: usize,
    pub failures: Vec<ImageFailure>,
    pub dangling: Vec<usize>,
    /// The annotation did not fit on the first page and was cut short.
    pub annotation_truncated: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExportReport {
    /// Catalog positions that got a page, in page order.
    pub fn exported_indices(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter_map(|page| match page {
                PageKind::Image { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// True when images were selected but none of them could be rendered,
    /// leaving a document with only the annotation (and filtered) page.
    pub fn all_images_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }
}
