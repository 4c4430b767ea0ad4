// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only snapshots of the session for display.

use std::fmt;

use dicomwerk_catalog::PageControl;

/// One table row of the visible page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Absolute catalog position; what selection and export labels use.
    pub index: usize,
    /// 1-based number shown to the user.
    pub display_number: usize,
    pub name: String,
    pub selected: bool,
}

/// The visible page of the catalog plus its navigation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub rows: Vec<RowView>,
    pub controls: Vec<PageControl>,
    pub current_page: usize,
    pub total_pages: usize,
    pub catalog_len: usize,
    pub selected_count: usize,
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "(catalog is empty)");
        }
        for row in &self.rows {
            let mark = if row.selected { "x" } else { " " };
            writeln!(
                f,
                "[{mark}] {:>4}  {}  (index {})",
                row.display_number, row.name, row.index
            )?;
        }

        let buttons: Vec<String> = self
            .controls
            .iter()
            .map(|control| match control {
                PageControl::First => "«1".to_owned(),
                PageControl::Page { number, active: true } => format!("[{number}]"),
                PageControl::Page { number, .. } => number.to_string(),
                PageControl::Ellipsis => "…".to_owned(),
                PageControl::Last { total } => format!("{total}»"),
            })
            .collect();
        writeln!(f, "{}", buttons.join(" "))?;
        write!(
            f,
            "page {}/{} · {} images · {} selected",
            self.current_page, self.total_pages, self.catalog_len, self.selected_count
        )
    }
}
