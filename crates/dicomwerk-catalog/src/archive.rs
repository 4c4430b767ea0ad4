// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Archive extraction — an explicit, ordered stream of named binary entries.
//
// Entries are yielded in the archive's central-directory order, one at a
// time, so the catalog can commit only after the last one has been read.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use dicomwerk_core::error::{DicomwerkError, Result};
use tracing::{debug, instrument};
use zip::ZipArchive;

/// Largest buffer reserved up front from an entry's declared size. The
/// header is untrusted; anything bigger grows as data actually arrives.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}

/// Whether an archive entry is a file or a directory marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry read out of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path of the entry inside the archive.
    pub path: String,
    pub kind: EntryKind,
    /// Decompressed contents. Empty for directories.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            data,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            data: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Zip archive read either from memory or from disk.
pub struct ZipSource<R> {
    archive: ZipArchive<R>,
}

impl ZipSource<Cursor<Vec<u8>>> {
    /// Parse an in-memory zip archive.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl ZipSource<File> {
    /// Open a zip archive on disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|err| {
            DicomwerkError::Import(format!("failed to open {}: {err}", path.as_ref().display()))
        })?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|err| DicomwerkError::Import(format!("not a readable zip archive: {err}")))?;
        debug!(entries = archive.len(), "zip archive opened");
        Ok(Self { archive })
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read the entry at `index` in declared order.
    pub fn entry(&mut self, index: usize) -> Result<ArchiveEntry> {
        let mut file = self.archive.by_index(index).map_err(|err| {
            DicomwerkError::Import(format!("failed to read archive entry {index}: {err}"))
        })?;
        let path = file.name().to_owned();
        if file.is_dir() {
            return Ok(ArchiveEntry::directory(path));
        }

        let mut data = Vec::with_capacity(prealloc_hint(file.size()));
        file.read_to_end(&mut data).map_err(|err| {
            DicomwerkError::Import(format!("failed to extract {path}: {err}"))
        })?;
        Ok(ArchiveEntry::file(path, data))
    }

    /// Lazily read every entry in declared order.
    pub fn entries(&mut self) -> impl Iterator<Item = Result<ArchiveEntry>> + '_ {
        (0..self.archive.len()).map(move |index| self.entry(index))
    }
}
