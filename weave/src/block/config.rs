use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_yml::{Mapping, Value};

use crate::syntax::Syntax;

/// The role a block plays when the document is woven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Source handed to the snippet compiler.
    Input,
    /// Receives the captured output of its tag's input.
    Output,
    /// Receives the contents of a file.
    File,
    /// Receives the standard output of a command.
    Command,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Input => "in",
            BlockKind::Output => "out",
            BlockKind::File => "file",
            BlockKind::Command => "cmd",
        }
    }

    /// Input and output blocks pair up by tag; file and command blocks stand alone.
    pub fn is_snippet(self) -> bool {
        matches!(self, BlockKind::Input | BlockKind::Output)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(BlockKind::Input),
            "out" => Ok(BlockKind::Output),
            "file" => Ok(BlockKind::File),
            "cmd" => Ok(BlockKind::Command),
            other => Err(ConfigError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("block must be valid YAML: {0}")]
    InvalidYaml(#[from] serde_yml::Error),
    #[error("block must be a YAML mapping")]
    NotAMapping,
    #[error(
        "no 'tag' element found. A 'tag' element is required to match snippet input and output blocks"
    )]
    MissingTag,
    #[error("unknown block type '{0}' (expected in, out, file or cmd)")]
    UnknownType(String),
    #[error("'{key}' must be {expected}")]
    InvalidField {
        key: &'static str,
        expected: &'static str,
    },
}

/// Configuration parsed from a control annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    pub tag: String,
    /// Declared role, from `type` or its legacy alias `io`, or implied by
    /// `file`/`cmd`. `None` leaves the role to classification.
    pub kind: Option<BlockKind>,
    /// File to include, as written (relative to the document directory).
    pub file: Option<PathBuf>,
    /// Command line to run.
    pub command: Option<String>,
    /// Absolute working directory for command blocks.
    pub working_dir: Option<PathBuf>,
    /// The whole annotation mapping, passed through to the snippet compiler.
    pub settings: Mapping,
}

impl BlockConfig {
    /// Parse a raw annotation, delimiters included.
    pub fn parse(annotation: &str, syntax: &Syntax, base_dir: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml(syntax.annotation_body(annotation), base_dir)
    }

    pub fn from_yaml(body: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        if body.trim().is_empty() {
            return Err(ConfigError::MissingTag);
        }
        let settings = match serde_yml::from_str::<Value>(body)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(ConfigError::NotAMapping),
        };

        let mut file = string_field(&settings, "file")?;
        let mut command = string_field(&settings, "cmd")?;

        let declared = match present(&settings, "type").or_else(|| present(&settings, "io")) {
            Some(value) => Some(
                scalar_text(value)
                    .ok_or(ConfigError::InvalidField {
                        key: "type",
                        expected: "one of in, out, file or cmd",
                    })?
                    .parse::<BlockKind>()?,
            ),
            None => None,
        };
        let kind = declared.or(if command.is_some() {
            Some(BlockKind::Command)
        } else if file.is_some() {
            Some(BlockKind::File)
        } else {
            None
        });

        let tag = match present(&settings, "tag") {
            Some(value) => scalar_text(value).ok_or(ConfigError::InvalidField {
                key: "tag",
                expected: "a string",
            })?,
            None => command
                .clone()
                .or_else(|| file.clone())
                .ok_or(ConfigError::MissingTag)?,
        };

        // A file or command block without the matching key is named by its tag.
        match kind {
            Some(BlockKind::File) if file.is_none() => file = Some(tag.clone()),
            Some(BlockKind::Command) if command.is_none() => command = Some(tag.clone()),
            _ => {}
        }

        let working_dir = match kind {
            Some(BlockKind::Command) => Some(match string_field(&settings, "wd")? {
                Some(wd) => base_dir.join(wd),
                None => base_dir.to_path_buf(),
            }),
            _ => None,
        };

        Ok(BlockConfig {
            tag,
            kind,
            file: file.map(PathBuf::from),
            command,
            working_dir,
            settings,
        })
    }
}

/// Text of a YAML scalar. Numbers and booleans use their YAML spelling.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn present<'a>(settings: &'a Mapping, key: &str) -> Option<&'a Value> {
    settings.get(key).filter(|value| !value.is_null())
}

fn string_field(settings: &Mapping, key: &'static str) -> Result<Option<String>, ConfigError> {
    match present(settings, key) {
        Some(value) => scalar_text(value).map(Some).ok_or(ConfigError::InvalidField {
            key,
            expected: "a string",
        }),
        None => Ok(None),
    }
}
