pub mod config;

use std::ops::Range;

pub use config::{BlockConfig, BlockKind, ConfigError};

use crate::location::SourceLocation;

/// An annotated code fence found during the collection pass.
#[derive(Debug, Clone)]
pub struct Block {
    pub config: BlockConfig,
    pub location: SourceLocation,
    /// Byte span from the annotation's opening token to the fence's closing token.
    pub span: Range<usize>,
    /// Fence text including its delimiter lines. Replaced during resolution.
    pub body: String,
    /// The block's role. Starts as the declared type and is filled in by
    /// classification when the annotation left it unset.
    pub kind: Option<BlockKind>,
}

impl Block {
    pub fn new(
        config: BlockConfig,
        location: SourceLocation,
        span: Range<usize>,
        body: String,
    ) -> Self {
        let kind = config.kind;
        Block {
            config,
            location,
            span,
            body,
            kind,
        }
    }

    pub fn tag(&self) -> &str {
        &self.config.tag
    }
}
