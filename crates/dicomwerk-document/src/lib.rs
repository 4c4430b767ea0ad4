// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// dicomwerk-document — Document output for Dicomwerk.
//
// Provides the PDF assembler that lays out the annotation page and one page
// per captured image, a small PDF reader for inspecting saved output, and the
// raster encoding used between capture and assembly.

pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `dicomwerk_document::PdfReader` etc.
pub use image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{DocumentAssembler, PageKind};
