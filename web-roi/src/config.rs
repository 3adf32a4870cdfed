use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::image::PLACEHOLDER_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // Size of the blank image returned when decoding fails
    pub placeholder_width: u32,
    pub placeholder_height: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            placeholder_width: PLACEHOLDER_SIZE,
            placeholder_height: PLACEHOLDER_SIZE,
        }
    }
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if config.placeholder_width == 0 || config.placeholder_height == 0 {
            anyhow::bail!(
                "Placeholder dimensions must be non-zero, got {}x{}",
                config.placeholder_width,
                config.placeholder_height
            );
        }

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn placeholder_dimensions(&self) -> (u32, u32) {
        (self.placeholder_width, self.placeholder_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("web_roi.json");

        let config = NodeConfig {
            placeholder_width: 640,
            placeholder_height: 480,
        };
        config.save(&path).unwrap();

        assert_eq!(NodeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "placeholder_height": 256 }"#).unwrap();

        let config = NodeConfig::load(&path).unwrap();
        assert_eq!(config.placeholder_dimensions(), (512, 256));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.json");
        fs::write(&path, r#"{ "placeholder_width": 0 }"#).unwrap();

        assert!(NodeConfig::load(&path).is_err());
    }
}
