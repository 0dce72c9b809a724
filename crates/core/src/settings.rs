//! User settings persistence.
//!
//! Settings are stored as JSON in the user's config directory
//! (e.g., `~/.config/region-stitch/settings.json` on Linux).

use crate::error::Result;
use crate::recognition::DEFAULT_PROMPT;
use crate::selection::GroupId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default type labels for the three groups.
pub const DEFAULT_GROUP_TAGS: [&str; GroupId::COUNT] = ["title", "body", "annotation"];

/// User-configurable settings persisted between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Type label recorded with each group's output.
    pub group_tags: [String; GroupId::COUNT],
    /// Recognition prompt; `{separator}` is replaced by the separator token.
    pub ocr_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            group_tags: DEFAULT_GROUP_TAGS.map(str::to_string),
            ocr_prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "region-stitch", "region-stitch").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to defaults if not found.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn tag(&self, group: GroupId) -> &str {
        &self.group_tags[group.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.group_tags[1] = "line-items".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.tag(GroupId::new(1).unwrap()), "line-items");
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        assert_eq!(Settings::load_from(&dir.path().join("missing.json")), Settings::default());
    }
}
