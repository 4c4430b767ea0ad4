// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dicomwerk Catalog — the ordered image catalog of the current session, the
// selection mask over it, and the paginated window the user browses.
//
// The three are deliberately independent: selection is keyed by absolute
// catalog position and is never rewritten by pagination or by a new import.

pub mod archive;
pub mod catalog;
pub mod pagination;
pub mod registry;
pub mod selection;

pub use archive::{ArchiveEntry, EntryKind, ZipSource};
pub use catalog::{CatalogChange, CatalogStore};
pub use pagination::{PageControl, Paginator};
pub use registry::PayloadRegistry;
pub use selection::SelectionIndex;
