use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yml::{Mapping, Value};
use weave::syntax::Syntax;

use crate::runner::DEFAULT_SNIPPET_COMPILER;

/// Settings file picked up from the document's directory.
pub const SETTINGS_FILE: &str = "snippet-weave.toml";

/// Settings shared by every block of a render.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Program run by the process-backed snippet runner.
    pub snippet_compiler: String,
    pub syntax: Syntax,
    /// Configuration merged under every input block's own annotation.
    pub defaults: Mapping,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            snippet_compiler: DEFAULT_SNIPPET_COMPILER.to_string(),
            syntax: Syntax::default(),
            defaults: Mapping::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("syntax token '{0}' must not be empty")]
    EmptyToken(&'static str),
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text)?;
        if let Some(token) = settings.syntax.empty_token() {
            return Err(SettingsError::EmptyToken(token));
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load [`SETTINGS_FILE`] from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        if path.is_file() {
            log::debug!("using settings from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Settings::default())
        }
    }

    /// The configuration handed to the snippet runner for an input block.
    pub fn merged_config(&self, block: &Mapping) -> Mapping {
        merge(&self.defaults, block)
    }
}

/// Deep merge: keys of `over` win, nested mappings merge recursively.
pub fn merge(base: &Mapping, over: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (key, value) in over {
        let combined = match (merged.get(key), value) {
            (Some(Value::Mapping(inner)), Value::Mapping(inner_over)) => {
                Value::Mapping(merge(inner, inner_over))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}
