pub mod error;
pub mod scanner;

pub use error::{ParseError, ParseErrorKind};
pub use scanner::{RawBlockPair, Scanner, scan};

use crate::Document;
use crate::block::Block;
use crate::block::config::BlockConfig;
use crate::syntax::Syntax;

/// Parser entry point for the collection pass.
pub struct Parser<'a> {
    document: &'a Document,
    syntax: &'a Syntax,
}

impl<'a> Parser<'a> {
    pub fn new(document: &'a Document, syntax: &'a Syntax) -> Self {
        Parser { document, syntax }
    }

    /// A fresh scan over the document's raw annotation/fence pairs.
    pub fn scan(&self) -> Scanner<'a> {
        scan(&self.document.text, self.document.source_id, self.syntax)
    }

    /// Every annotated fence as an unclassified [`Block`], in document order.
    pub fn blocks(&self) -> impl Iterator<Item = Result<Block, ParseError>> + 'a {
        let document = self.document;
        let syntax = self.syntax;
        self.scan().map(move |pair| {
            let pair = pair?;
            let config = BlockConfig::parse(pair.annotation, syntax, &document.base_dir)
                .map_err(|e| ParseError::config(e, pair.annotation_span.clone(), pair.location))?;
            Ok(Block::new(
                config,
                pair.location,
                pair.annotation_span.start..pair.fence_span.end,
                pair.fence.to_string(),
            ))
        })
    }

    pub fn parse(&self) -> Result<Vec<Block>, ParseError> {
        self.blocks().collect()
    }
}
