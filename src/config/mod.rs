//! Startup flags shared between the command line and rc files.
//!
//! rc files hold the same `--flag` tokens as the command line, one or more
//! per line, with `#` comments. The global file lives in the platform config
//! directory; a `.mermaid-studiorc` in the working directory is layered on top,
//! and the command line wins over both.

mod preferences;

pub use preferences::{PreferenceStore, Preferences};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::theme::Theme;

const APP_DIR: &str = "mermaid-studio";
const LOCAL_RC: &str = ".mermaid-studiorc";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    /// The theme requested explicitly, if any.
    pub const fn explicit(self) -> Option<Theme> {
        match self {
            Self::Auto => None,
            Self::Light => Some(Theme::Light),
            Self::Dark => Some(Theme::Dark),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_images: bool,
    pub force_half_cell: bool,
    pub theme: Option<ThemeMode>,
    pub out_dir: Option<PathBuf>,
    pub render_delay_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Layer `other` over `self`: switches accumulate, options from `other`
    /// take precedence.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_images: self.no_images || other.no_images,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            theme: other.theme.or(self.theme),
            out_dir: other.out_dir.clone().or_else(|| self.out_dir.clone()),
            render_delay_ms: other.render_delay_ms.or(self.render_delay_ms),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }
}

/// Per-user directory for rc and preference files.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR);
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR);
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR);
        }
    }

    PathBuf::from(".")
}

pub fn global_config_path() -> PathBuf {
    config_dir().join("config")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

pub fn preferences_path() -> PathBuf {
    config_dir().join("preferences.json")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mermaid-studio defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if flags.force_half_cell {
        lines.push("--force-half-cell".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(dir) = &flags.out_dir {
        lines.push(format!("--out-dir {}", dir.display()));
    }
    if let Some(ms) = flags.render_delay_ms {
        lines.push(format!("--render-delay-ms {ms}"));
    }
    if let Some(log) = &flags.log_file {
        lines.push(format!("--log-file {}", log.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the recognized flags out of a token list, ignoring everything else.
///
/// Options accept both `--flag value` and `--flag=value`.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let mut value = || {
            inline.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" => flags.watch = true,
            "--no-images" => flags.no_images = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--theme" => flags.theme = value().as_deref().and_then(parse_theme),
            "--out-dir" => flags.out_dir = value().map(PathBuf::from),
            "--render-delay-ms" => {
                flags.render_delay_ms = value().and_then(|v| v.parse().ok());
            }
            "--log-file" => flags.log_file = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "mermaid-studio",
            "--watch",
            "--no-images",
            "--theme",
            "dark",
            "--out-dir=exports",
            "--render-delay-ms",
            "300",
            "--log-file=studio.log",
            "--force-half-cell",
            "diagram.mmd",
        ]));
        assert!(flags.watch);
        assert!(flags.no_images);
        assert!(flags.force_half_cell);
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.out_dir, Some(PathBuf::from("exports")));
        assert_eq!(flags.render_delay_ms, Some(300));
        assert_eq!(flags.log_file, Some(PathBuf::from("studio.log")));
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--export", "png", "--template=Mindmap"]));
        assert_eq!(flags, ConfigFlags::default());
    }

    #[test]
    fn test_bad_delay_is_dropped() {
        let flags = parse_flag_tokens(&tokens(&["--render-delay-ms", "soon"]));
        assert_eq!(flags.render_delay_ms, None);
    }

    #[test]
    fn test_theme_mode_explicit() {
        assert_eq!(ThemeMode::Auto.explicit(), None);
        assert_eq!(ThemeMode::Dark.explicit(), Some(Theme::Dark));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(LOCAL_RC);
        let flags = ConfigFlags {
            watch: true,
            no_images: true,
            force_half_cell: true,
            theme: Some(ThemeMode::Light),
            out_dir: Some(PathBuf::from("exports")),
            render_delay_ms: Some(0),
            log_file: Some(PathBuf::from("studio.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
