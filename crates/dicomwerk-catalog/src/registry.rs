// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Idempotent payload registration with the render engine.
//
// Payloads are fingerprinted with SHA-256. Registering bytes the engine
// already holds returns the existing handle, so one payload never has two
// engine-side handles with different lifetimes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dicomwerk_core::PayloadHandle;
use dicomwerk_core::error::Result;
use dicomwerk_render::RenderEngine;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Tracks which payloads are registered with an engine, keyed by content digest.
pub struct PayloadRegistry {
    engine: Arc<dyn RenderEngine>,
    by_digest: HashMap<String, PayloadHandle>,
}

impl PayloadRegistry {
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            by_digest: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    /// Number of distinct payloads currently registered.
    pub fn len(&self) -> usize {
        self.by_digest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_digest.is_empty()
    }

    /// Register `payload`, reusing the existing handle for identical bytes.
    pub fn register(&mut self, payload: &Arc<[u8]>) -> Result<PayloadHandle> {
        let digest = content_digest(payload);
        if let Some(handle) = self.by_digest.get(&digest) {
            debug!(%handle, "payload already registered");
            return Ok(handle.clone());
        }
        let handle = self.engine.register_payload(Arc::clone(payload))?;
        debug!(%handle, bytes = payload.len(), "payload registered");
        self.by_digest.insert(digest, handle.clone());
        Ok(handle)
    }

    /// Release every handle not in `live`. Returns how many were released.
    pub fn retain(&mut self, live: &HashSet<PayloadHandle>) -> usize {
        let engine = &self.engine;
        let before = self.by_digest.len();
        self.by_digest.retain(|_, handle| {
            let keep = live.contains(handle);
            if !keep {
                engine.release_payload(handle);
            }
            keep
        });
        before - self.by_digest.len()
    }
}

/// SHA-256 of `data` as a lowercase hex string.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
