// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-agnostic trait definitions for decoding and off-screen rendering.

use std::sync::Arc;

use dicomwerk_core::PayloadHandle;
use dicomwerk_core::error::Result;
use image::RgbaImage;
use tokio::sync::{Mutex, oneshot};

/// Identifies one off-screen surface held by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface:{}", self.0)
    }
}

/// How an engine reports that a painted surface is ready to capture.
#[derive(Debug)]
pub enum RenderSignal {
    /// The surface already holds the finished frame.
    Complete,
    /// The engine fires the sender once the frame is on the surface.
    /// Dropping the sender without sending means the render failed.
    Pending(oneshot::Receiver<()>),
    /// The engine gives no completion signal at all. Callers fall back to a
    /// fixed settle delay and accept that a slow render may be captured
    /// blank or stale.
    Unsignalled,
}

/// Unified engine contract grouping payload registration, decoding, and
/// surface management.
///
/// One engine instance backs a single drawing context, so callers must not
/// render two images onto surfaces of the same engine concurrently. Hold
/// [`RenderEngine::render_gate`] from surface acquisition until release.
pub trait RenderEngine: PayloadStore + ImageDecoder + SurfaceHost {
    /// Human-readable engine name for logs.
    fn engine_name(&self) -> &str;

    /// The lock serializing use of this engine's drawing context. Every
    /// caller sharing the engine must go through this same lock.
    fn render_gate(&self) -> &Mutex<()>;
}

/// Registration of raw file bytes with the engine.
pub trait PayloadStore: Send + Sync {
    /// Hand `payload` to the engine and return the handle it will be known by.
    fn register_payload(&self, payload: Arc<[u8]>) -> Result<PayloadHandle>;

    /// Forget a payload and anything decoded from it. Unknown handles are ignored.
    fn release_payload(&self, handle: &PayloadHandle);
}

/// Decoding and painting of registered payloads.
pub trait ImageDecoder: Send + Sync {
    /// Decode the payload behind `handle`. May block; run it off the async
    /// executor.
    fn decode(&self, handle: &PayloadHandle) -> Result<()>;

    /// Paint a previously decoded image onto `surface`.
    fn display(&self, surface: SurfaceId, handle: &PayloadHandle) -> Result<RenderSignal>;
}

/// Lifecycle of off-screen drawing surfaces.
pub trait SurfaceHost: Send + Sync {
    /// Create a blank surface of the given size.
    fn acquire_surface(&self, width: u32, height: u32) -> Result<SurfaceId>;

    /// Copy out the current contents of `surface`.
    fn capture(&self, surface: SurfaceId) -> Result<RgbaImage>;

    /// Destroy `surface`. Unknown ids are ignored.
    fn release_surface(&self, surface: SurfaceId);
}
