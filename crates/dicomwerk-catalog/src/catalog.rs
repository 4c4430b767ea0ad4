// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalog store — the ordered list of images imported in this session.
//
// Imports are staged off to the side and swapped in with a single
// assignment, so readers only ever see the previous catalog or the complete
// new one.

use std::collections::HashSet;
use std::sync::Arc;

use dicomwerk_core::error::{DicomwerkError, Result};
use dicomwerk_core::{ImageId, ImageReference};
use dicomwerk_render::RenderEngine;
use tracing::{debug, info, instrument, warn};

use crate::archive::ArchiveEntry;
use crate::registry::PayloadRegistry;

/// Summary of a committed catalog replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogChange {
    /// Incremented on every commit.
    pub generation: u64,
    pub previous_len: usize,
    pub len: usize,
}

/// Ordered image references for the current import session.
pub struct CatalogStore {
    entries: Vec<ImageReference>,
    registry: PayloadRegistry,
    next_id: u64,
    generation: u64,
}

impl CatalogStore {
    /// Create an empty catalog whose payloads register with `engine`.
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            entries: Vec::new(),
            registry: PayloadRegistry::new(engine),
            next_id: 0,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageReference> {
        self.entries.get(index)
    }

    /// Like [`CatalogStore::get`] but reports a missing index as an error.
    pub fn require(&self, index: usize) -> Result<&ImageReference> {
        self.entries.get(index).ok_or(DicomwerkError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn entries(&self) -> &[ImageReference] {
        &self.entries
    }

    pub fn engine(&self) -> &Arc<dyn RenderEngine> {
        self.registry.engine()
    }

    /// Replace the catalog with exactly one image.
    #[instrument(skip(self, payload), fields(bytes_len = payload.len()))]
    pub fn import_single(&mut self, name: &str, payload: Vec<u8>) -> Result<CatalogChange> {
        let staged = match self.stage(name.to_owned(), payload) {
            Ok(reference) => vec![reference],
            Err(err) => {
                self.release_unpublished();
                return Err(err);
            }
        };
        Ok(self.commit(staged))
    }

    /// Replace the catalog with the file entries of an archive, in order.
    ///
    /// Directory entries are skipped. If any entry fails to extract, or the
    /// archive holds no files at all, the current catalog is left untouched.
    #[instrument(skip_all)]
    pub fn import_archive<I>(&mut self, entries: I) -> Result<CatalogChange>
    where
        I: IntoIterator<Item = Result<ArchiveEntry>>,
    {
        let mut staged = Vec::new();
        let mut skipped_dirs = 0usize;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, staged = staged.len(), "archive import aborted");
                    self.release_unpublished();
                    return Err(err);
                }
            };
            if entry.is_dir() {
                skipped_dirs += 1;
                continue;
            }
            match self.stage(entry.path, entry.data) {
                Ok(reference) => staged.push(reference),
                Err(err) => {
                    self.release_unpublished();
                    return Err(err);
                }
            }
        }

        if staged.is_empty() {
            self.release_unpublished();
            return Err(DicomwerkError::Import("archive contains no files".into()));
        }

        debug!(files = staged.len(), skipped_dirs, "archive fully extracted");
        Ok(self.commit(staged))
    }

    /// Register one payload and build its reference without publishing it.
    fn stage(&mut self, name: String, payload: Vec<u8>) -> Result<ImageReference> {
        let payload: Arc<[u8]> = payload.into();
        let handle = self.registry.register(&payload)?;
        let id = ImageId(self.next_id);
        self.next_id += 1;
        Ok(ImageReference {
            id,
            name,
            handle,
            payload,
        })
    }

    /// Atomically publish `staged` as the new catalog.
    fn commit(&mut self, staged: Vec<ImageReference>) -> CatalogChange {
        let previous_len = self.entries.len();
        self.entries = staged;
        self.generation += 1;

        let live: HashSet<_> = self.entries.iter().map(|r| r.handle.clone()).collect();
        let released = self.registry.retain(&live);

        info!(
            generation = self.generation,
            previous_len,
            len = self.entries.len(),
            released,
            "catalog replaced"
        );
        CatalogChange {
            generation: self.generation,
            previous_len,
            len: self.entries.len(),
        }
    }

    /// Drop registrations made for an import that never got committed.
    fn release_unpublished(&mut self) {
        let live: HashSet<_> = self.entries.iter().map(|r| r.handle.clone()).collect();
        self.registry.retain(&live);
    }
}
