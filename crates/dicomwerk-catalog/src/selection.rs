// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selection mask keyed by absolute catalog position.

use std::collections::BTreeMap;

use tracing::debug;

/// Sparse boolean mask over catalog positions. Absent means unselected.
///
/// The mask knows nothing about the catalog or the page window. A new import
/// does not touch it; call [`SelectionIndex::prune`] to drop flags that point
/// past the end of a shorter catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionIndex {
    flags: BTreeMap<usize, bool>,
}

impl SelectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag at `index` and return the new state.
    pub fn toggle(&mut self, index: usize) -> bool {
        let flag = self.flags.entry(index).or_insert(false);
        *flag = !*flag;
        debug!(index, selected = *flag, "selection toggled");
        *flag
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.flags.get(&index).copied().unwrap_or(false)
    }

    /// Selected positions in ascending order.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .filter_map(|(&index, &selected)| selected.then_some(index))
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Selected positions at or beyond `catalog_len`.
    pub fn dangling(&self, catalog_len: usize) -> Vec<usize> {
        self.flags
            .range(catalog_len..)
            .filter_map(|(&index, &selected)| selected.then_some(index))
            .collect()
    }

    /// Drop every flag at or beyond `catalog_len`. Returns how many selected
    /// positions were removed.
    pub fn prune(&mut self, catalog_len: usize) -> usize {
        let removed = self.flags.split_off(&catalog_len);
        let dropped = removed.values().filter(|&&selected| selected).count();
        if dropped > 0 {
            debug!(catalog_len, dropped, "stale selection pruned");
        }
        dropped
    }
}
