use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::block::config::ConfigError;
use crate::location::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The annotation/fence grammar itself is broken.
    Scan,
    /// The annotation body is not a usable configuration mapping.
    InvalidConfig,
    /// No tag could be determined for a block.
    MissingTag,
}

/// Parse errors with source location information.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} (line {line})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Range<usize>,
    /// 1-based line the error is reported on.
    pub line: usize,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn scan(message: impl Into<String>, span: Range<usize>, location: SourceLocation) -> Self {
        ParseError {
            kind: ParseErrorKind::Scan,
            message: message.into(),
            span,
            line: location.line,
            file_id: location.source_id,
            notes: Vec::new(),
        }
    }

    /// Attach a location to a configuration problem found in an annotation.
    pub fn config(error: ConfigError, span: Range<usize>, location: SourceLocation) -> Self {
        let kind = match error {
            ConfigError::MissingTag => ParseErrorKind::MissingTag,
            _ => ParseErrorKind::InvalidConfig,
        };
        ParseError {
            kind,
            message: format!("invalid snippet control block: {}", error),
            span,
            line: location.line,
            file_id: location.source_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
