use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::modules::toast::{DEFAULT_STYLE, DISMISS_AFTER, MessagePolicy, TOAST_AREA_ID};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastSettings {
    pub area_id: String,
    pub default_style: String,
    pub dismiss_after_ms: u64,
    pub escape_messages: bool,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            area_id: TOAST_AREA_ID.to_string(),
            default_style: DEFAULT_STYLE.to_string(),
            dismiss_after_ms: DISMISS_AFTER.as_millis() as u64,
            escape_messages: false,
        }
    }
}

impl ToastSettings {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }

    pub fn message_policy(&self) -> MessagePolicy {
        MessagePolicy::from_escape_flag(self.escape_messages)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub styles: Vec<String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            styles: [DEFAULT_STYLE, "bg-success", "bg-danger", "bg-warning", "bg-info", "bg-primary"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub toast: ToastSettings,
    pub ui: UiSettings,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub path: PathBuf,
    pub toast: ToastSettings,
    pub ui: UiSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    /// Reads the config at `path`, writing a default one first if it is missing.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            let default = ConfigFile::default();
            let toml = toml::to_string_pretty(&default)?;
            if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
            fs::write(&path, toml).with_context(|| format!("Writing default config {:?}", &path))?;
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Reading {:?}", &path))?;
        let cfg = parse(&content, &path)?;
        Ok(Self { path, toast: cfg.toast, ui: cfg.ui })
    }
}

fn parse(content: &str, path: &Path) -> Result<ConfigFile> {
    let mut cfg: ConfigFile = toml::from_str(content).with_context(|| format!("Parsing config TOML {:?}", path))?;
    if cfg.toast.default_style.trim().is_empty() {
        cfg.toast.default_style = DEFAULT_STYLE.to_string();
    }
    if cfg.ui.styles.is_empty() {
        cfg.ui = UiSettings::default();
    }
    Ok(cfg)
}

fn config_path() -> Result<PathBuf> {
    let base = config_dir().context("Could not determine config directory")?;
    Ok(base.join("toaster").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("toaster-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn defaults_match_toast_constants() {
        let s = ToastSettings::default();
        assert_eq!(s.area_id, "toast-area");
        assert_eq!(s.default_style, "bg-dark");
        assert_eq!(s.dismiss_after(), Duration::from_millis(5000));
        assert_eq!(s.message_policy(), MessagePolicy::Verbatim);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = scratch_dir("create");
        let path = dir.join("config.toml");
        let cfg = Config::load_from(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.toast, ToastSettings::default());
        assert_eq!(cfg.ui, UiSettings::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse("[toast]\nescape_messages = true\ndismiss_after_ms = 1500\n", Path::new("x.toml")).unwrap();
        assert!(cfg.toast.escape_messages);
        assert_eq!(cfg.toast.dismiss_after(), Duration::from_millis(1500));
        assert_eq!(cfg.toast.area_id, "toast-area");
        assert_eq!(cfg.ui, UiSettings::default());
    }

    #[test]
    fn blank_style_and_empty_presets_fall_back() {
        let cfg = parse("[toast]\ndefault_style = \"\"\n[ui]\nstyles = []\n", Path::new("x.toml")).unwrap();
        assert_eq!(cfg.toast.default_style, "bg-dark");
        assert!(!cfg.ui.styles.is_empty());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let err = parse("[toast\n", Path::new("broken.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }
}
