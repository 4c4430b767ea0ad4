// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and persisting `AppConfig` as JSON.

use std::path::{Path, PathBuf};

use dicomwerk_core::AppConfig;
use dicomwerk_core::error::Result;
use tracing::{debug, info, warn};

use super::data_dir;

pub const CONFIG_FILE: &str = "config.json";

/// Default location of the config file.
pub fn config_path() -> PathBuf {
    data_dir::data_dir().join(CONFIG_FILE)
}

/// Read the config at `path`, falling back to defaults when the file is
/// missing or cannot be parsed.
pub fn load_config(path: &Path) -> AppConfig {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no config file, using defaults");
            return AppConfig::default();
        }
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
            AppConfig::default()
        }
    }
}

pub fn persist_config(path: &Path, config: &AppConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicomwerk_core::{PageSize, SelectionOnImport};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(&dir.path().join(CONFIG_FILE));
        assert_eq!(config.canvas_size, 512);
        assert_eq!(config.output_name, "selected-dicom-images.pdf");
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").expect("write");
        assert_eq!(load_config(&path).max_page_buttons, 5);
    }

    #[test]
    fn persisted_config_is_loaded_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = AppConfig {
            page_size: PageSize::Twenty,
            selection_on_import: SelectionOnImport::Prune,
            ..AppConfig::default()
        };
        persist_config(&path, &config).expect("persist");

        let loaded = load_config(&path);
        assert_eq!(loaded.page_size, PageSize::Twenty);
        assert_eq!(loaded.selection_on_import, SelectionOnImport::Prune);
    }

    #[test]
    fn invalid_config_is_not_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            canvas_size: 0,
            ..AppConfig::default()
        };
        assert!(persist_config(&path, &config).is_err());
        assert!(!path.exists());
    }
}
