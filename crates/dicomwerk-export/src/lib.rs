// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dicomwerk Export — turns the catalog, the selection, and an annotation into
// one assembled PDF, and talks to the remote noise-reduction service.
//
// Rendering is strictly sequential: every selected image borrows the engine's
// single drawing context in turn, and a failure on one image never aborts the
// rest of the export.

pub mod coordinator;
pub mod filter;
pub mod job;

pub use coordinator::{ExportCoordinator, ExportSettings};
pub use filter::FilterClient;
pub use job::{ExportEvent, ExportItem, ExportJob, ExportReport, ImageFailure, ImageStage};
