// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Software render engine backed by the `image` crate.
//
// Payloads are decoded on demand and cached per handle. Surfaces are plain
// RGBA buffers; painting letterboxes the decoded image onto a black canvas.
// Rendering finishes inside `display`, so completion is always signalled
// immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use dicomwerk_core::PayloadHandle;
use dicomwerk_core::error::{DicomwerkError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, instrument, warn};

use crate::traits::*;

/// In-process engine for formats the `image` crate can decode.
pub struct SoftwareEngine {
    state: Mutex<EngineState>,
    render_gate: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct EngineState {
    payloads: HashMap<PayloadHandle, Arc<[u8]>>,
    decoded: HashMap<PayloadHandle, DynamicImage>,
    surfaces: HashMap<SurfaceId, RgbaImage>,
    next_payload: u64,
    next_surface: u64,
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            render_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Number of surfaces currently acquired and not yet released.
    pub fn live_surfaces(&self) -> usize {
        self.state.lock().map(|s| s.surfaces.len()).unwrap_or(0)
    }

    /// Number of payloads currently registered.
    pub fn registered_payloads(&self) -> usize {
        self.state.lock().map(|s| s.payloads.len()).unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| DicomwerkError::Render("software engine state poisoned".into()))
    }
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for SoftwareEngine {
    fn engine_name(&self) -> &str {
        "software"
    }

    fn render_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.render_gate
    }
}

impl PayloadStore for SoftwareEngine {
    fn register_payload(&self, payload: Arc<[u8]>) -> Result<PayloadHandle> {
        let mut state = self.state()?;
        let handle = PayloadHandle(format!("blob:{}", state.next_payload));
        state.next_payload += 1;
        state.payloads.insert(handle.clone(), payload);
        Ok(handle)
    }

    fn release_payload(&self, handle: &PayloadHandle) {
        if let Ok(mut state) = self.state.lock() {
            state.payloads.remove(handle);
            state.decoded.remove(handle);
        }
    }
}

impl ImageDecoder for SoftwareEngine {
    #[instrument(skip(self), fields(%handle))]
    fn decode(&self, handle: &PayloadHandle) -> Result<()> {
        let payload = {
            let state = self.state()?;
            if state.decoded.contains_key(handle) {
                return Ok(());
            }
            state
                .payloads
                .get(handle)
                .cloned()
                .ok_or_else(|| DicomwerkError::Render(format!("unknown payload {handle}")))?
        };

        // Decode without holding the lock; decoding can take a while.
        let image = image::load_from_memory(&payload).map_err(|err| {
            DicomwerkError::Render(format!("failed to decode {handle}: {err}"))
        })?;
        debug!(width = image.width(), height = image.height(), "payload decoded");

        self.state()?.decoded.insert(handle.clone(), image);
        Ok(())
    }

    fn display(&self, surface: SurfaceId, handle: &PayloadHandle) -> Result<RenderSignal> {
        let mut state = self.state()?;
        let image = state
            .decoded
            .get(handle)
            .ok_or_else(|| DicomwerkError::Render(format!("{handle} has not been decoded")))?;
        let fitted = fit_to_canvas(image, surface_dims(&state, surface)?);

        let canvas = state
            .surfaces
            .get_mut(&surface)
            .ok_or_else(|| DicomwerkError::Render(format!("unknown {surface}")))?;
        for pixel in canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 255]);
        }
        let x = (canvas.width() - fitted.width()) / 2;
        let y = (canvas.height() - fitted.height()) / 2;
        imageops::overlay(canvas, &fitted, i64::from(x), i64::from(y));

        Ok(RenderSignal::Complete)
    }
}

impl SurfaceHost for SoftwareEngine {
    fn acquire_surface(&self, width: u32, height: u32) -> Result<SurfaceId> {
        if width == 0 || height == 0 {
            return Err(DicomwerkError::Render(format!(
                "cannot create a {width}x{height} surface"
            )));
        }
        let mut state = self.state()?;
        let id = SurfaceId(state.next_surface);
        state.next_surface += 1;
        if !state.surfaces.is_empty() {
            warn!(live = state.surfaces.len(), "surface acquired while another is live");
        }
        state
            .surfaces
            .insert(id, RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])));
        Ok(id)
    }

    fn capture(&self, surface: SurfaceId) -> Result<RgbaImage> {
        self.state()?
            .surfaces
            .get(&surface)
            .cloned()
            .ok_or_else(|| DicomwerkError::Render(format!("unknown {surface}")))
    }

    fn release_surface(&self, surface: SurfaceId) {
        if let Ok(mut state) = self.state.lock() {
            state.surfaces.remove(&surface);
        }
    }
}

fn surface_dims(state: &EngineState, surface: SurfaceId) -> Result<(u32, u32)> {
    state
        .surfaces
        .get(&surface)
        .map(|canvas| canvas.dimensions())
        .ok_or_else(|| DicomwerkError::Render(format!("unknown {surface}")))
}

/// Scale `image` to fit inside `(width, height)` preserving aspect ratio.
fn fit_to_canvas(image: &DynamicImage, (width, height): (u32, u32)) -> RgbaImage {
    if image.width() <= width && image.height() <= height {
        return image.to_rgba8();
    }
    image.resize(width, height, FilterType::Triangle).to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Arc<[u8]> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encode png");
        buf.into_inner().into()
    }

    #[test]
    fn render_gate_is_shared_by_every_handle() {
        let engine: Arc<dyn RenderEngine> = Arc::new(SoftwareEngine::new());
        let other = Arc::clone(&engine);

        let held = engine.render_gate().try_lock().expect("first lock");
        assert!(other.render_gate().try_lock().is_err());
        drop(held);
        assert!(other.render_gate().try_lock().is_ok());
    }

    #[test]
    fn paints_letterboxed_image() {
        let engine = SoftwareEngine::new();
        let handle = engine
            .register_payload(png_bytes(4, 2, [255, 0, 0, 255]))
            .expect("register");
        engine.decode(&handle).expect("decode");

        let surface = engine.acquire_surface(8, 8).expect("surface");
        let signal = engine.display(surface, &handle).expect("display");
        assert!(matches!(signal, RenderSignal::Complete));

        let frame = engine.capture(surface).expect("capture");
        // 4x2 image centred on 8x8 black canvas: rows 3..5, cols 2..6.
        assert_eq!(frame.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(frame.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        engine.release_surface(surface);
        assert_eq!(engine.live_surfaces(), 0);
    }

    #[test]
    fn large_images_are_downscaled_to_canvas() {
        let engine = SoftwareEngine::new();
        let handle = engine
            .register_payload(png_bytes(64, 32, [0, 255, 0, 255]))
            .expect("register");
        engine.decode(&handle).expect("decode");
        let surface = engine.acquire_surface(16, 16).expect("surface");
        engine.display(surface, &handle).expect("display");
        assert_eq!(engine.capture(surface).expect("capture").dimensions(), (16, 16));
    }

    #[test]
    fn garbage_payload_fails_decode() {
        let engine = SoftwareEngine::new();
        let handle = engine
            .register_payload(Arc::from(&b"DICM not really"[..]))
            .expect("register");
        assert!(matches!(engine.decode(&handle), Err(DicomwerkError::Render(_))));
    }

    #[test]
    fn display_requires_decode() {
        let engine = SoftwareEngine::new();
        let handle = engine
            .register_payload(png_bytes(2, 2, [0, 0, 255, 255]))
            .expect("register");
        let surface = engine.acquire_surface(4, 4).expect("surface");
        assert!(engine.display(surface, &handle).is_err());
    }

    #[test]
    fn release_payload_forgets_it() {
        let engine = SoftwareEngine::new();
        let handle = engine
            .register_payload(png_bytes(2, 2, [0, 0, 255, 255]))
            .expect("register");
        assert_eq!(engine.registered_payloads(), 1);
        engine.release_payload(&handle);
        assert_eq!(engine.registered_payloads(), 0);
        assert!(engine.decode(&handle).is_err());
    }
}
