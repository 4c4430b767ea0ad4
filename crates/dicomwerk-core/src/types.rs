// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Dicomwerk.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DicomwerkError, Result};

/// Catalog-unique identifier for an imported image.
///
/// Ids are handed out by the catalog from a monotonic counter, so they stay
/// unique even when two imports contain byte-identical payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub u64);

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "image:{}", self.0)
    }
}

/// Engine-side handle for a registered payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadHandle(pub String);

impl std::fmt::Display for PayloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One image in the catalog. Immutable once created.
#[derive(Debug, Clone)]
pub struct ImageReference {
    pub id: ImageId,
    /// Archive entry path, or the file name for single-file imports.
    pub name: String,
    /// Handle under which the payload is registered with the render engine.
    pub handle: PayloadHandle,
    /// The raw file bytes.
    pub payload: Arc<[u8]>,
}

/// Unique identifier for one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of catalog rows shown per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Five,
    Ten,
    Twenty,
}

impl PageSize {
    /// Every page size the control surface offers, smallest first.
    pub const ALL: [PageSize; 3] = [PageSize::Five, PageSize::Ten, PageSize::Twenty];

    pub fn get(self) -> usize {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = DicomwerkError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            20 => Ok(Self::Twenty),
            other => Err(DicomwerkError::Config(format!(
                "page size must be 5, 10 or 20 (got {other})"
            ))),
        }
    }
}

/// Paper sizes for the assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::Letter => (216, 279),
        }
    }
}

/// Result of one round-trip through the external filter service.
#[derive(Debug, Clone)]
pub struct FilteredImage {
    /// Catalog image the filter was applied to.
    pub source: ImageId,
    /// Encoded image returned by the service (BMP or PNG in practice).
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the service, if any.
    pub content_type: Option<String>,
}

/// How an input file should be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single image file.
    Single,
    /// A zip archive holding any number of image entries.
    Archive,
}

impl InputKind {
    /// `.zip` files are archives; everything else is treated as one image
    /// and left for the render engine to accept or reject.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Self::Archive,
            _ => Self::Single,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_round_trips_through_usize() {
        for size in PageSize::ALL {
            assert_eq!(PageSize::try_from(size.get()).expect("valid size"), size);
        }
    }

    #[test]
    fn page_size_rejects_unlisted_values() {
        assert!(PageSize::try_from(7).is_err());
        assert!(PageSize::try_from(0).is_err());
    }

    #[test]
    fn input_kind_from_extension() {
        assert_eq!(InputKind::from_path(Path::new("study.ZIP")), InputKind::Archive);
        assert_eq!(InputKind::from_path(Path::new("slice.dcm")), InputKind::Single);
        assert_eq!(InputKind::from_path(Path::new("noext")), InputKind::Single);
    }

    #[test]
    fn image_id_display() {
        assert_eq!(ImageId(7).to_string(), "image:7");
    }
}
