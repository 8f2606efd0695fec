//! Editor configuration.
//!
//! All settings have defaults, so a config file only needs the keys it wants
//! to change:
//!
//! ```json
//! { "historyLimit": 50, "snapToGrid": true, "gridSize": 20 }
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_STORAGE_KEY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EditorConfig {
    /// Maximum number of history snapshots kept in memory, the current state included.
    pub history_limit: usize,
    /// Snap dragged elements to the grid when the drag ends.
    pub snap_to_grid: bool,
    /// Grid spacing in diagram coordinates.
    pub grid_size: f64,
    /// Disable every mutating action.
    pub read_only: bool,
    /// Key under which the diagram collection is persisted.
    pub storage_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 200,
            snap_to_grid: false,
            grid_size: 10.0,
            read_only: false,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl EditorConfig {
    /// Read a JSON config file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Read config {}", path))?;
        let config: EditorConfig =
            serde_json::from_str(&text).with_context(|| format!("Parse config {}", path))?;
        log::debug!("loaded editor config from {}: {:?}", path, config);
        Ok(config)
    }

    /// Read `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Snap a coordinate to the grid if snapping is enabled.
    pub fn snap(&self, value: f64) -> f64 {
        if self.snap_to_grid && self.grid_size > 0.0 {
            (value / self.grid_size).round() * self.grid_size
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"historyLimit": 5, "readOnly": true}"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert!(config.read_only);
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(serde_json::from_str::<EditorConfig>(r#"{"histroyLimit": 5}"#).is_err());
    }

    #[test]
    fn test_snap() {
        let mut config = EditorConfig::default();
        assert_eq!(config.snap(12.0), 12.0);
        config.snap_to_grid = true;
        assert_eq!(config.snap(12.0), 10.0);
        assert_eq!(config.snap(15.0), 20.0);
        config.grid_size = 0.0;
        assert_eq!(config.snap(12.0), 12.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("editor.json")).unwrap();
        std::fs::write(&path, r#"{"snapToGrid": true, "gridSize": 25}"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert!(config.snap_to_grid);
        assert_eq!(config.grid_size, 25.0);

        assert!(EditorConfig::load(&path.with_file_name("missing.json")).is_err());
        assert_eq!(EditorConfig::load_or_default(None).unwrap(), EditorConfig::default());
    }
}
