// Leadsheet configuration, stored as RON

use crate::command::DEFAULT_MAX_HISTORY;
use crate::error::{LeadsheetError, Result};
use crate::timeline::Quantization;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunable behaviour of a leadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadsheetConfig {
    /// Grid used when snapping chord symbols and annotations
    #[serde(default)]
    pub quantization: Quantization,
    /// Number of edits kept on the undo stack
    #[serde(default = "default_max_undo_history")]
    pub max_undo_history: usize,
    /// Prefix of generated section names ("Section" gives "Section1", "Section2"...)
    #[serde(default = "default_section_name_prefix")]
    pub section_name_prefix: String,
}

fn default_max_undo_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_section_name_prefix() -> String {
    "Section".to_string()
}

impl Default for LeadsheetConfig {
    fn default() -> Self {
        Self {
            quantization: Quantization::default(),
            max_undo_history: default_max_undo_history(),
            section_name_prefix: default_section_name_prefix(),
        }
    }
}

impl LeadsheetConfig {
    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)
            .map_err(|e| LeadsheetError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LeadsheetError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load from the default location, falling back to defaults when there is no file
    pub fn load_or_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_undo_history == 0 {
            return Err(LeadsheetError::Config(
                "max_undo_history must be at least 1".to_string(),
            ));
        }
        if self.section_name_prefix.trim().is_empty() {
            return Err(LeadsheetError::Config(
                "section_name_prefix cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/leadsheet/config.ron`, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("leadsheet").join("config.ron"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = LeadsheetConfig::default();
        assert_eq!(config.quantization, Quantization::Beat);
        assert_eq!(config.max_undo_history, 100);
        assert_eq!(config.section_name_prefix, "Section");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = LeadsheetConfig::from_ron("(quantization: HalfBeat)").unwrap();
        assert_eq!(config.quantization, Quantization::HalfBeat);
        assert_eq!(config.max_undo_history, 100);
        assert_eq!(config.section_name_prefix, "Section");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LeadsheetConfig::from_ron("(max_undo_history: 0)"),
            Err(LeadsheetError::Config(_))
        ));
        assert!(matches!(
            LeadsheetConfig::from_ron("not ron at all"),
            Err(LeadsheetError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");
        let config = LeadsheetConfig {
            quantization: Quantization::OneThirdBeat,
            max_undo_history: 12,
            section_name_prefix: "Part".to_string(),
        };

        config.save(&path).unwrap();
        assert_eq!(LeadsheetConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = LeadsheetConfig::load(&dir.path().join("missing.ron"));
        assert!(matches!(result, Err(LeadsheetError::Io(_))));
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("leadsheet/config.ron"));
        }
    }
}
