// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Dicomwerk.

use thiserror::Error;

/// Top-level error type for all Dicomwerk operations.
#[derive(Debug, Error)]
pub enum DicomwerkError {
    // -- Import errors --
    #[error("import failed: {0}")]
    Import(String),

    #[error("image index {index} is outside the catalog ({len} images)")]
    IndexOutOfRange { index: usize, len: usize },

    // -- Render errors --
    #[error("render engine error: {0}")]
    Render(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Filter service errors --
    #[error("filter service unreachable: {0}")]
    FilterTransport(String),

    #[error("filter service returned {status}: {body}")]
    FilterRejected { status: u16, body: String },

    // -- Document errors --
    #[error("document assembly failed: {0}")]
    Assembly(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The four failure families the export pipeline distinguishes, plus a
/// catch-all for configuration and plumbing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input file or archive. The prior catalog is untouched.
    Import,
    /// Per-image failure inside the export pipeline. Absorbed by the coordinator.
    DecodeRender,
    /// Network failure or non-success response from the filter service.
    FilterService,
    /// Failure while serializing or saving the assembled document. Fatal.
    Assembly,
    Other,
}

impl DicomwerkError {
    /// Classify this error into one of the pipeline's error families.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Import(_) => ErrorKind::Import,
            Self::Render(_) | Self::ImageError(_) => ErrorKind::DecodeRender,
            Self::FilterTransport(_) | Self::FilterRejected { .. } => ErrorKind::FilterService,
            Self::Assembly(_) | Self::PdfError(_) => ErrorKind::Assembly,
            Self::IndexOutOfRange { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DicomwerkError>;
