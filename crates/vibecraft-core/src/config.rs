use crate::error::{Result, VibecraftError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Project layout read from `.vibecraft/config.yaml`. The file is optional;
/// a missing file or a missing key means the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,
    #[serde(default = "default_shared_dir")]
    pub shared_dir: String,
    #[serde(default = "default_integration_dir")]
    pub integration_dir: String,
}

fn default_modules_dir() -> String {
    "modules".to_string()
}

fn default_shared_dir() -> String {
    "shared".to_string()
}

fn default_integration_dir() -> String {
    "integration".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            shared_dir: default_shared_dir(),
            integration_dir: default_integration_dir(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        // An empty file parses as YAML null.
        let cfg: Option<Config> = serde_yaml::from_str(&data)?;
        let cfg = cfg.unwrap_or_default();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Every directory must be a non-empty relative path without `..`.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("modules_dir", &self.modules_dir),
            ("shared_dir", &self.shared_dir),
            ("integration_dir", &self.integration_dir),
        ] {
            check_relative_dir(key, value)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Resolved paths
    // -----------------------------------------------------------------------

    pub fn modules_path(&self, root: &Path) -> PathBuf {
        root.join(&self.modules_dir)
    }

    pub fn shared_path(&self, root: &Path) -> PathBuf {
        root.join(&self.shared_dir)
    }

    pub fn integration_path(&self, root: &Path) -> PathBuf {
        root.join(&self.integration_dir)
    }

    pub fn connectors_path(&self, root: &Path) -> PathBuf {
        self.integration_path(root).join(paths::CONNECTORS_DIR)
    }

    /// Registry `path` value for a module.
    pub fn module_rel_path(&self, name: &str) -> String {
        format!("{}/{name}", self.modules_dir.trim_end_matches('/'))
    }
}

fn check_relative_dir(key: &str, value: &str) -> Result<()> {
    let invalid = |why: &str| {
        Err(VibecraftError::Configuration(format!(
            "{key} '{value}' {why}"
        )))
    };
    if value.trim().is_empty() {
        return invalid("must not be empty");
    }
    let path = Path::new(value);
    if path.is_absolute() || value.starts_with('/') || value.starts_with('\\') {
        return invalid("must be relative to the project root");
    }
    if path.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_))) {
        return invalid("must stay inside the project root");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
