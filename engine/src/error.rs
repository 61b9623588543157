use std::io;
use std::ops::Range;
use std::path::PathBuf;
use std::process::ExitStatus;

use weave::location::SourceLocation;
use weave::parser::ParseError;

use crate::runner::RunnerError;

/// A fatal error for the whole document. There is no partial render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "found multiple code blocks marked as 'input' with tag '{tag}' (line {line}). Only output blocks may appear multiple times; an output block that appears before its input block must be explicitly marked"
    )]
    MultipleInputs {
        tag: String,
        line: usize,
        span: Range<usize>,
    },

    #[error("output block with tag '{tag}' (line {line}) has no input block")]
    MissingInput {
        tag: String,
        line: usize,
        span: Range<usize>,
    },

    #[error("no code block with tag '{0}'")]
    TagNotFound(String),

    #[error("could not find code block at {0}")]
    LocationNotFound(SourceLocation),

    #[error("cannot read '{}' (line {line}): {source}", .path.display())]
    FileRead {
        path: PathBuf,
        line: usize,
        span: Range<usize>,
        source: io::Error,
    },

    #[error("cannot split command '{command}' (line {line}) into arguments")]
    InvalidCommand {
        command: String,
        line: usize,
        span: Range<usize>,
    },

    #[error("cannot use working directory '{}' (line {line}): {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        line: usize,
        span: Range<usize>,
        source: io::Error,
    },

    #[error("cannot run command '{command}' (line {line}): {source}")]
    CommandSpawn {
        command: String,
        line: usize,
        span: Range<usize>,
        source: io::Error,
    },

    #[error("command '{command}' (line {line}) failed with {status}")]
    CommandFailed {
        command: String,
        line: usize,
        span: Range<usize>,
        status: ExitStatus,
        stderr: String,
    },

    #[error("cannot run the snippet compiler for tag '{tag}' (line {line}): {source}")]
    Snippet {
        tag: String,
        line: usize,
        span: Range<usize>,
        source: RunnerError,
    },
}

impl RenderError {
    /// Byte span of the offending block, for diagnostics.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            RenderError::Parse(e) => Some(e.span.clone()),
            RenderError::MultipleInputs { span, .. }
            | RenderError::MissingInput { span, .. }
            | RenderError::FileRead { span, .. }
            | RenderError::InvalidCommand { span, .. }
            | RenderError::WorkingDirectory { span, .. }
            | RenderError::CommandSpawn { span, .. }
            | RenderError::CommandFailed { span, .. }
            | RenderError::Snippet { span, .. } => Some(span.clone()),
            RenderError::TagNotFound(_) | RenderError::LocationNotFound(_) => None,
        }
    }

    pub fn notes(&self) -> Vec<String> {
        match self {
            RenderError::Parse(e) => e.notes.clone(),
            RenderError::CommandFailed { stderr, .. } if !stderr.trim().is_empty() => {
                vec![format!("stderr:\n{}", stderr.trim_end())]
            }
            _ => Vec::new(),
        }
    }
}
