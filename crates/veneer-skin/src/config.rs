//! Persisted engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use veneer_types::error::Result;

fn yes() -> bool {
    true
}

/// User-facing settings the host persists between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Directory of the currently selected skin; empty means vanilla.
    #[serde(default)]
    pub selected_skin_path: String,
    /// Apply the selected skin as soon as the host reaches its first frame.
    #[serde(default = "yes")]
    pub apply_on_startup: bool,
    /// Reapply the skin when its files change on disk.
    #[serde(default)]
    pub auto_reload: bool,
    /// Show the skin-manager icon while in game.
    #[serde(default = "yes")]
    pub show_manager_icon_ingame: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            selected_skin_path: String::new(),
            apply_on_startup: true,
            auto_reload: false,
            show_manager_icon_ingame: true,
        }
    }
}

impl Configuration {
    /// Load from a TOML file; any failure logs and yields defaults.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("bad config at {}: {e} -- using defaults", path.display());
                Self::default()
            },
        }
    }

    /// Save as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert!(config.selected_skin_path.is_empty());
        assert!(config.apply_on_startup);
        assert!(!config.auto_reload);
        assert!(config.show_manager_icon_ingame);
    }

    #[test]
    fn toml_roundtrip() {
        let config = Configuration {
            selected_skin_path: "skins/midnight".to_string(),
            apply_on_startup: false,
            auto_reload: true,
            show_manager_icon_ingame: false,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Configuration = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: Configuration = toml::from_str("selected_skin_path = \"skins/x\"").unwrap();
        assert_eq!(config.selected_skin_path, "skins/x");
        assert!(config.apply_on_startup);
        assert!(!config.auto_reload);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let config = Configuration::load(Path::new("/nonexistent/veneer.toml"));
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("veneer_config_{}.toml", std::process::id()));
        let config = Configuration {
            selected_skin_path: "skins/dark".to_string(),
            apply_on_startup: true,
            auto_reload: true,
            show_manager_icon_ingame: false,
        };
        config.save(&path).unwrap();
        let back = Configuration::load(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, back);
    }
}
