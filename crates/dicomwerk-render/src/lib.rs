// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dicomwerk Render — the contract between the export pipeline and whatever
// engine decodes and paints images onto off-screen surfaces.
//
// The engine is stateful: it owns registered payloads, decoded images, and
// the surfaces they are painted onto. Callers hold surfaces through
// `ScopedSurface` so every acquisition is matched by a release.

pub mod software;
pub mod surface;
pub mod traits;

use std::sync::Arc;

pub use software::SoftwareEngine;
pub use surface::ScopedSurface;
pub use traits::{ImageDecoder, PayloadStore, RenderEngine, RenderSignal, SurfaceHost, SurfaceId};

/// Returns the engine used when the caller does not supply one.
///
/// The software engine decodes every format the `image` crate understands
/// and signals render completion synchronously.
pub fn default_engine() -> Arc<dyn RenderEngine> {
    Arc::new(SoftwareEngine::new())
}
