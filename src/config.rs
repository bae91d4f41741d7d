//! User configuration and the on-disk layout of the shell's state directory.

use crate::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Theme names accepted by `theme`.
pub const THEMES: &[&str] = &["default", "dark", "matrix", "ocean", "sunset"];

#[cfg(windows)]
const DEFAULT_INTERPRETER: &str = "C:\\Program Files\\PowerShell\\7\\pwsh.exe";
#[cfg(not(windows))]
const DEFAULT_INTERPRETER: &str = "/bin/sh";

/// Persisted shell options.
///
/// Missing keys take their defaults; keys this version does not know about are
/// kept in `extra` so that saving does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub show_time: bool,
    pub show_git: bool,
    pub show_venv: bool,
    pub max_path_length: usize,
    pub history_size: usize,
    pub prompt_char: String,
    #[serde(alias = "powershell_path")]
    pub interpreter_path: PathBuf,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            show_time: true,
            show_git: true,
            show_venv: true,
            max_path_length: 50,
            history_size: 10000,
            prompt_char: ">".to_string(),
            interpreter_path: PathBuf::from(DEFAULT_INTERPRETER),
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Read the config document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ShellError::StoreRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ShellError::StoreFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Config::load`], but falls back to defaults and logs the failure.
    ///
    /// A missing file is the normal first-run case and is not logged.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ShellError::StoreFormat {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| ShellError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Render a single option for display, `None` when it is not set.
    pub fn get(&self, key: &str) -> Option<String> {
        self.to_map().get(key).map(display_value)
    }

    /// All options sorted by key, rendered for display.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .to_map()
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect();
        entries.sort();
        entries
    }

    /// Set an option from user text.
    ///
    /// The text is read as a JSON scalar when it parses as one (`true`, `42`)
    /// and as a plain string otherwise. Known keys must keep their type; the
    /// config is unchanged when they do not.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
            _ => Value::String(raw.to_string()),
        };

        let mut map = self.to_map();
        let value = match map.get(key) {
            // Paths and strings accept any text verbatim.
            Some(Value::String(_)) => Value::String(raw.to_string()),
            _ => value,
        };
        map.insert(key.to_string(), value);

        let updated: Config = serde_json::from_value(Value::Object(map))
            .map_err(|e| ShellError::Config(format!("invalid value for {key}: {e}")))?;
        *self = updated;
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Locations of everything the shell persists.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub aliases: PathBuf,
    pub bookmarks: PathBuf,
    pub plugins: PathBuf,
    pub history: PathBuf,
    pub startup_script: PathBuf,
}

impl ShellPaths {
    /// Lay out the state files under `root`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config.json"),
            aliases: root.join("aliases.json"),
            bookmarks: root.join("bookmarks.json"),
            plugins: root.join("plugins"),
            history: root.join("history"),
            startup_script: root.join("startup.dsh"),
            root,
        }
    }

    /// `~/.devishell`, or `./.devishell` when no home directory is known.
    pub fn user_default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::under(home.join(".devishell"))
    }

    /// Create the state directory and the plugin directory.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.plugins).map_err(|source| ShellError::StoreWrite {
            path: self.plugins.clone(),
            source,
        })
    }
}
