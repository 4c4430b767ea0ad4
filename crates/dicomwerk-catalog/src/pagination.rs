// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagination — the visible window of the catalog and the sliding row of page
// buttons beneath it.
//
// Pages are 1-based. The button row shows at most `max_buttons` consecutive
// page numbers around the current page, plus explicit first/last buttons
// when those pages fall outside the window and an ellipsis when more than
// one page is hidden between the window and that endpoint.

use std::ops::Range;

use dicomwerk_core::PageSize;
use tracing::debug;

/// One element of the page-button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    /// Jump to page 1.
    First,
    /// A numbered page button.
    Page { number: usize, active: bool },
    /// Hidden pages between the window and an endpoint.
    Ellipsis,
    /// Jump to the last page, which is `total`.
    Last { total: usize },
}

/// `ceil(catalog_len / page_size)`; zero for an empty catalog.
pub fn total_pages(catalog_len: usize, page_size: usize) -> usize {
    catalog_len.div_ceil(page_size.max(1))
}

/// Lay out the page-button row.
///
/// `current_page` is clamped into `[1, total_pages]` first, so the row always
/// marks exactly one page active unless the catalog is empty, in which case
/// the row is empty.
pub fn compute(
    catalog_len: usize,
    page_size: usize,
    current_page: usize,
    max_buttons: usize,
) -> Vec<PageControl> {
    let total = total_pages(catalog_len, page_size);
    if total == 0 {
        return Vec::new();
    }
    let max_buttons = max_buttons.clamp(1, total);
    let current = current_page.clamp(1, total);

    let mut start = current.saturating_sub(max_buttons / 2).max(1);
    let end = (start + max_buttons - 1).min(total);
    if end - start + 1 < max_buttons {
        start = (end + 1).saturating_sub(max_buttons).max(1);
    }

    let mut controls = Vec::with_capacity(max_buttons + 4);
    if start > 1 {
        controls.push(PageControl::First);
        if start > 2 {
            controls.push(PageControl::Ellipsis);
        }
    }
    controls.extend((start..=end).map(|number| PageControl::Page {
        number,
        active: number == current,
    }));
    if end < total {
        if end + 1 < total {
            controls.push(PageControl::Ellipsis);
        }
        controls.push(PageControl::Last { total });
    }
    controls
}

/// Current page, page size, and button-window width for one catalog view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    current_page: usize,
    page_size: PageSize,
    max_buttons: usize,
    catalog_len: usize,
}

impl Paginator {
    pub fn new(page_size: PageSize, max_buttons: usize) -> Self {
        Self {
            current_page: 1,
            page_size,
            max_buttons: max_buttons.max(1),
            catalog_len: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn max_buttons(&self) -> usize {
        self.max_buttons
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.catalog_len, self.page_size.get())
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
        debug!(page_size = page_size.get(), "page size changed");
    }

    /// Track a new catalog length, clamping the current page into range.
    pub fn set_catalog_len(&mut self, catalog_len: usize) {
        self.catalog_len = catalog_len;
        self.current_page = self.clamp(self.current_page);
    }

    /// Go to `page`, clamped into the valid range. Returns the page landed on.
    pub fn go_to(&mut self, page: usize) -> usize {
        self.current_page = self.clamp(page);
        self.current_page
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.current_page + 1)
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.current_page.saturating_sub(1))
    }

    /// Follow a button from [`Paginator::controls`]. Ellipses do nothing.
    pub fn activate(&mut self, control: PageControl) -> usize {
        match control {
            PageControl::First => self.go_to(1),
            PageControl::Page { number, .. } => self.go_to(number),
            PageControl::Last { total } => self.go_to(total),
            PageControl::Ellipsis => self.current_page,
        }
    }

    /// The button row for the current state.
    pub fn controls(&self) -> Vec<PageControl> {
        compute(
            self.catalog_len,
            self.page_size.get(),
            self.current_page,
            self.max_buttons,
        )
    }

    /// Catalog positions shown on the current page.
    pub fn visible_range(&self) -> Range<usize> {
        let size = self.page_size.get();
        let start = ((self.current_page - 1) * size).min(self.catalog_len);
        let end = (self.current_page * size).min(self.catalog_len);
        start..end
    }

    /// The part of `catalog` shown on the current page.
    ///
    /// Uses the slice's own length for truncation, so a catalog that changed
    /// size without [`Paginator::set_catalog_len`] yields a short or empty
    /// window rather than a panic.
    pub fn visible_slice<'a, T>(&self, catalog: &'a [T]) -> &'a [T] {
        let size = self.page_size.get();
        let start = ((self.current_page - 1) * size).min(catalog.len());
        let end = (self.current_page * size).min(catalog.len());
        &catalog[start..end]
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }
}
