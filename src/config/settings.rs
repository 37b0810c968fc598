use std::path::Path;

use serde::Deserialize;

use super::job::RemovalMethod;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rendering resolution for the sweep. 72 DPI keeps pixels aligned with
    /// PDF points.
    pub dpi: u32,
    pub threshold: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_steps: u32,
    pub method: RemovalMethod,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dpi: 72,
            threshold: 0.8,
            min_scale: 0.5,
            max_scale: 1.5,
            scale_steps: 10,
            method: RemovalMethod::Cover,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::DelogoError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
