//! Settings: `editor.*` and `languages.<id>.*` TOML tables.
//!
//! Unknown keys are preserved by `toml`'s default deserialization tolerance
//! (ignored, never rejected) so older/newer settings files round-trip
//! without forcing a schema bump.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error reading {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("parse error in {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("unknown setting {0:?}")]
    UnknownSetting(String),
    #[error("type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_tab_width", rename = "tab-width")]
    pub tab_width: u32,
    #[serde(default = "EditorConfig::default_show_whitespace", rename = "show-whitespace")]
    pub show_whitespace: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: Self::default_tab_width(),
            show_whitespace: Self::default_show_whitespace(),
        }
    }
}

impl EditorConfig {
    const fn default_tab_width() -> u32 {
        4
    }

    const fn default_show_whitespace() -> bool {
        true
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LanguageConfig {
    pub name: Option<String>,
    pub extensions: Option<String>,
    #[serde(rename = "tab-width")]
    pub tab_width: Option<u32>,
    #[serde(rename = "language-server")]
    pub language_server: Option<String>,
    pub grammar: Option<String>,
}

impl LanguageConfig {
    pub fn extension_list(&self) -> Vec<&str> {
        self.extensions.as_deref().map(|s| s.split_whitespace().collect()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
}

impl Config {
    pub fn tab_width(&self) -> usize {
        self.file.editor.tab_width as usize
    }

    pub fn show_whitespace(&self) -> bool {
        self.file.editor.show_whitespace
    }

    pub fn language_for_extension(&self, ext: &str) -> Option<(&str, &LanguageConfig)> {
        self.file
            .languages
            .iter()
            .find(|(_, lang)| lang.extension_list().contains(&ext))
            .map(|(id, lang)| (id.as_str(), lang))
    }

    /// Apply a `section.key = value` setting at runtime, rejecting a value
    /// that doesn't match the declared schema type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "editor.tab-width" => {
                self.file.editor.tab_width = value.parse().map_err(|_| Error::TypeMismatch {
                    key: key.to_string(),
                    expected: "integer",
                })?;
            }
            "editor.show-whitespace" => {
                self.file.editor.show_whitespace = value.parse().map_err(|_| Error::TypeMismatch {
                    key: key.to_string(),
                    expected: "bool",
                })?;
            }
            _ => return Err(Error::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}

fn xdg_config_home() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

/// `$XDG_CONFIG_HOME/dged/dged.toml`.
pub fn discover() -> PathBuf {
    xdg_config_home().join("dged").join("dged.toml")
}

/// `$XDG_CONFIG_HOME/dged/log`, falling back to a temp dir when no config
/// home can be resolved at all.
pub fn log_dir() -> PathBuf {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(_) => xdg_config_home().join("dged").join("log"),
        None if dirs::home_dir().is_some() => xdg_config_home().join("dged").join("log"),
        None => std::env::temp_dir().join("dged").join("log"),
    }
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no settings file found, using defaults");
            return Ok(Config::default());
        }
        Err(source) => return Err(Error::Io { path, source }),
    };
    let file: ConfigFile = toml::from_str(&content).map_err(|source| Error::Parse { path: path.clone(), source })?;
    Ok(Config {
        raw: Some(content),
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.tab_width(), 4);
        assert!(cfg.show_whitespace());
    }

    #[test]
    fn parses_editor_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[editor]\ntab-width = 2\nshow-whitespace = false\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.tab_width(), 2);
        assert!(!cfg.show_whitespace());
    }

    #[test]
    fn parses_languages_table_and_resolves_by_extension() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[languages.rust]\nname = \"Rust\"\nextensions = \"rs\"\ntab-width = 4\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (id, lang) = cfg.language_for_extension("rs").unwrap();
        assert_eq!(id, "rust");
        assert_eq!(lang.name.as_deref(), Some("Rust"));
    }

    #[test]
    fn unknown_toml_keys_are_ignored_not_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[editor]\nfuture-key = 99\n").unwrap();
        assert!(load_from(Some(tmp.path().to_path_buf())).is_ok());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("editor.nope", "1"), Err(Error::UnknownSetting(_))));
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("editor.tab-width", "not-a-number"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            cfg.set("editor.show-whitespace", "not-a-bool"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn set_applies_valid_values() {
        let mut cfg = Config::default();
        cfg.set("editor.tab-width", "8").unwrap();
        cfg.set("editor.show-whitespace", "false").unwrap();
        assert_eq!(cfg.tab_width(), 8);
        assert!(!cfg.show_whitespace());
    }
}
