// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped off-screen surface. Released on drop, whichever way the holder exits.

use std::sync::Arc;

use dicomwerk_core::PayloadHandle;
use dicomwerk_core::error::Result;
use image::RgbaImage;
use tracing::debug;

use crate::traits::{RenderEngine, RenderSignal, SurfaceId};

/// A surface borrowed from an engine for the duration of one render.
pub struct ScopedSurface {
    engine: Arc<dyn RenderEngine>,
    id: SurfaceId,
}

impl ScopedSurface {
    /// Acquire a `width` x `height` surface from `engine`.
    pub fn acquire(engine: Arc<dyn RenderEngine>, width: u32, height: u32) -> Result<Self> {
        let id = engine.acquire_surface(width, height)?;
        debug!(%id, width, height, engine = engine.engine_name(), "surface acquired");
        Ok(Self { engine, id })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Paint the decoded image behind `handle` onto this surface.
    pub fn display(&self, handle: &PayloadHandle) -> Result<RenderSignal> {
        self.engine.display(self.id, handle)
    }

    /// Copy out the surface contents.
    pub fn capture(&self) -> Result<RgbaImage> {
        self.engine.capture(self.id)
    }
}

impl Drop for ScopedSurface {
    fn drop(&mut self) {
        self.engine.release_surface(self.id);
        debug!(id = %self.id, "surface released");
    }
}
