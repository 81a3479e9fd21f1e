use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Values remembered between sessions.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// JSON file holding [`Preferences`].
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored preferences. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid preferences file {}", self.path.display()))
    }

    /// Persist `theme`, keeping any other stored values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        let mut prefs = self.load().unwrap_or_default();
        prefs.theme = Some(theme);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&prefs)?;
        fs::write(&self.path, format!("{json}\n"))
            .with_context(|| format!("Failed to write preferences {}", self.path.display()))?;
        tracing::info!(%theme, path = %self.path.display(), "theme preference saved");
        Ok(())
    }
}
