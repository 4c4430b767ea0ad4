// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One review session: the catalog, the selection over it, the page the user
// is looking at, the annotation, and the last filtered image.
//
// Mutation happens through `&mut self`, so an import can never overlap an
// export running from the same session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dicomwerk_catalog::{CatalogChange, CatalogStore, Paginator, SelectionIndex, ZipSource};
use dicomwerk_core::error::{DicomwerkError, Result};
use dicomwerk_core::{AppConfig, FilteredImage, InputKind, PageSize, SelectionOnImport};
use dicomwerk_export::{ExportCoordinator, ExportEvent, ExportJob, ExportReport, FilterClient};
use dicomwerk_render::RenderEngine;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::state::{PageView, RowView};

pub struct Session {
    config: AppConfig,
    catalog: CatalogStore,
    selection: SelectionIndex,
    paginator: Paginator,
    annotation: String,
    filtered: Option<FilteredImage>,
    coordinator: ExportCoordinator,
    filter: FilterClient,
}

impl Session {
    pub fn new(engine: Arc<dyn RenderEngine>, config: AppConfig) -> Result<Self> {
        config.validate()?;
        let filter = FilterClient::new(config.filter_endpoint.clone())?;
        let coordinator = ExportCoordinator::from_config(Arc::clone(&engine), &config);
        info!(engine = engine.engine_name(), "session started");

        Ok(Self {
            catalog: CatalogStore::new(engine),
            selection: SelectionIndex::new(),
            paginator: Paginator::new(config.page_size, config.max_page_buttons),
            annotation: String::new(),
            filtered: None,
            coordinator,
            filter,
            config,
        })
    }

    /// Report export progress on `events`.
    pub fn with_export_events(mut self, events: mpsc::UnboundedSender<ExportEvent>) -> Self {
        self.coordinator = self.coordinator.with_events(events);
        self
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionIndex {
        &self.selection
    }

    pub fn filtered(&self) -> Option<&FilteredImage> {
        self.filtered.as_ref()
    }

    pub fn output_path(&self) -> PathBuf {
        self.coordinator.settings().output_path.clone()
    }

    // -- Import ---------------------------------------------------------------

    /// Replace the catalog with the contents of `path`.
    ///
    /// `.zip` files are imported entry by entry; anything else becomes a
    /// one-image catalog. On failure the previous catalog stays in place.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_path(&mut self, path: &Path) -> Result<CatalogChange> {
        let change = match InputKind::from_path(path) {
            InputKind::Archive => {
                let mut source = ZipSource::open(path)?;
                self.catalog.import_archive(source.entries())?
            }
            InputKind::Single => {
                let payload = std::fs::read(path).map_err(|err| {
                    DicomwerkError::Import(format!("failed to read {}: {err}", path.display()))
                })?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.catalog.import_single(&name, payload)?
            }
        };
        self.after_import(&change);
        Ok(change)
    }

    /// Like [`Session::import_path`] for input already in memory.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn import_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<CatalogChange> {
        let change = match InputKind::from_path(Path::new(name)) {
            InputKind::Archive => {
                let mut source = ZipSource::from_bytes(bytes)?;
                self.catalog.import_archive(source.entries())?
            }
            InputKind::Single => self.catalog.import_single(name, bytes)?,
        };
        self.after_import(&change);
        Ok(change)
    }

    fn after_import(&mut self, change: &CatalogChange) {
        match self.config.selection_on_import {
            SelectionOnImport::Prune => {
                let pruned = self.selection.prune(change.len);
                if pruned > 0 {
                    info!(pruned, "selection trimmed to the new catalog");
                }
            }
            SelectionOnImport::Keep => {
                let dangling = self.selection.dangling(change.len);
                if !dangling.is_empty() {
                    warn!(?dangling, "selected positions outlive the new catalog");
                }
            }
        }
        self.paginator.set_catalog_len(change.len);
    }

    // -- Selection and paging -------------------------------------------------

    /// Flip the selection flag of catalog position `index`.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        self.catalog.require(index)?;
        Ok(self.selection.toggle(index))
    }

    /// Mark catalog position `index` selected. Already selected stays selected.
    pub fn select(&mut self, index: usize) -> Result<()> {
        self.catalog.require(index)?;
        if !self.selection.is_selected(index) {
            self.selection.toggle(index);
        }
        Ok(())
    }

    /// Select every catalog entry that is not selected yet.
    pub fn select_all(&mut self) {
        for index in 0..self.catalog.len() {
            if !self.selection.is_selected(index) {
                self.selection.toggle(index);
            }
        }
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.paginator.set_page_size(page_size);
    }

    /// Jump to `page`, clamped to the pages that exist.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.paginator.go_to(page)
    }

    pub fn page_view(&self) -> PageView {
        let range = self.paginator.visible_range();
        let rows = self
            .paginator
            .visible_slice(self.catalog.entries())
            .iter()
            .zip(range)
            .map(|(image, index)| RowView {
                index,
                display_number: index + 1,
                name: image.name.clone(),
                selected: self.selection.is_selected(index),
            })
            .collect();

        PageView {
            rows,
            controls: self.paginator.controls(),
            current_page: self.paginator.current_page(),
            total_pages: self.paginator.total_pages(),
            catalog_len: self.catalog.len(),
            selected_count: self.selection.selected_count(),
        }
    }

    // -- Annotation, filtering, export ----------------------------------------

    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        self.annotation = annotation.into();
    }

    /// Run catalog image `index` through the filter service.
    ///
    /// On success the result replaces any earlier filtered image. On failure
    /// the earlier one, if any, is kept.
    pub async fn apply_filter(&mut self, index: usize) -> Result<&FilteredImage> {
        let image = self.catalog.require(index)?.clone();
        let filtered = self.filter.apply(&image).await?;
        Ok(&*self.filtered.insert(filtered))
    }

    /// Export the current selection.
    pub async fn export(&self) -> Result<ExportReport> {
        let job = ExportJob::plan(
            self.catalog.entries(),
            &self.selection,
            self.annotation.clone(),
            self.filtered.clone(),
        );
        self.coordinator.export(job).await
    }
}
