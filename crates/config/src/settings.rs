// Grid settings
// Loaded from ~/.config/statgrid/settings.json

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    // Data grid extent
    #[serde(rename = "grid.minRows")]
    pub min_rows: usize,

    #[serde(rename = "grid.minColumns")]
    pub min_columns: usize,

    #[serde(rename = "grid.defaultColumnWidth")]
    pub default_column_width: u32,

    // New variables
    #[serde(rename = "variables.numericWidth")]
    pub numeric_width: u32,

    #[serde(rename = "variables.numericDecimals")]
    pub numeric_decimals: u32,

    #[serde(rename = "variables.minStringWidth")]
    pub min_string_width: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            // Grid
            min_rows: 100,
            min_columns: 45,
            default_column_width: 64,
            // Variables
            numeric_width: 8,
            numeric_decimals: 2,
            min_string_width: 8,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Data grid: rows/columns shown even when the dataset is smaller
    "grid.minRows": 100,
    "grid.minColumns": 45,
    "grid.defaultColumnWidth": 64,

    // Variables created from typed or pasted data
    "variables.numericWidth": 8,
    "variables.numericDecimals": 2,
    "variables.minStringWidth": 8
}
"#;

impl GridSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("statgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path, creating a commented default
    /// file when none exists.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            Self::create_default_file(&path);
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Self = serde_json::from_str(&cleaned)?;
        Ok(settings.sanitized())
    }

    /// Widths of zero would make every value truncate to nothing
    fn sanitized(mut self) -> Self {
        if self.numeric_width == 0 {
            warn!("variables.numericWidth must be at least 1; using 8");
            self.numeric_width = 8;
        }
        if self.min_string_width == 0 {
            warn!("variables.minStringWidth must be at least 1; using 8");
            self.min_string_width = 8;
        }
        self
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Save current settings to the default path
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    fn create_default_file(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Error creating config directory: {}", e);
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
