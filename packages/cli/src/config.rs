use pagecraft_bundle::ExportOptions;
use pagecraft_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Pagecraft project configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Editing session settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportOptions,

    /// Directory holding saved pages, one JSON file each
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Custom component catalog; the built-in one is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
}

fn default_storage_dir() -> String {
    "pages".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the page storage directory
    pub fn get_storage_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.storage_dir)
    }

    pub fn get_schema_path(&self, cwd: &Path) -> Option<PathBuf> {
        self.schema_path.as_ref().map(|path| cwd.join(path))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            export: ExportOptions::default(),
            storage_dir: default_storage_dir(),
            schema_path: None,
        }
    }
}
